//! Run configuration.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::reference::{clean_path, ComponentReference, Roots};

/// Glob used when an include names only a directory.
pub const DEFAULT_INCLUDE_GLOB: &str = "**/*.{yaml,yml,json}";

/// Namespace of the named schemas in a specification document.
pub const COMPONENTS_SCHEMAS: &str = "components/schemas";

/// A model directory (relative to the model root) to scan, with an
/// optional file glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub path: String,
    pub glob: String,
}

impl Include {
    /// Parse `path` or `path:glob`, e.g. `pets:{cat,dog}-model.yaml`.
    pub fn parse(include: &str) -> Self {
        match include.split_once(':') {
            Some((path, glob)) if !glob.trim().is_empty() => Self {
                path: path.trim().to_string(),
                glob: glob.trim().to_string(),
            },
            Some((path, _)) => Self::directory(path),
            None => Self::directory(include),
        }
    }

    /// Every document under `path`.
    pub fn directory(path: &str) -> Self {
        Self {
            path: path.trim().to_string(),
            glob: DEFAULT_INCLUDE_GLOB.to_string(),
        }
    }
}

/// Settings for a generation run.
///
/// # Example
///
/// ```
/// use schema_typegen::Settings;
///
/// let settings = Settings::new("/work/api", "/work/models")
///     .unwrap()
///     .spec("/work/api/openapi.yaml")
///     .unwrap()
///     .spec_package("example.com/api")
///     .model_package("example.com/models")
///     .include("pets:*.yaml");
///
/// assert_eq!(settings.includes.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Settings {
    pub roots: Roots,
    /// Absolute path of the specification document, if any.
    pub spec: Option<PathBuf>,
    /// Base package of types rooted under the specification tree.
    pub spec_package: String,
    /// Base package of types rooted under the model tree.
    pub model_package: String,
    pub includes: Vec<Include>,
}

impl Settings {
    /// Both roots must be absolute paths.
    pub fn new(
        spec_root: impl AsRef<Path>,
        model_root: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            roots: Roots::new(spec_root, model_root)?,
            spec: None,
            spec_package: String::new(),
            model_package: String::new(),
            includes: Vec::new(),
        })
    }

    /// Use the specification document at `path`, which must be absolute and
    /// under the specification root.
    pub fn spec(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(ConfigError::RelativeRoot {
                path: path.to_path_buf(),
            });
        }
        let path = clean_path(path);
        if !path.starts_with(self.roots.specification()) {
            return Err(ConfigError::SpecOutsideRoot {
                path,
                root: self.roots.specification().to_path_buf(),
            });
        }
        self.spec = Some(path);
        Ok(self)
    }

    pub fn spec_package(mut self, package: impl Into<String>) -> Self {
        self.spec_package = package.into();
        self
    }

    pub fn model_package(mut self, package: impl Into<String>) -> Self {
        self.model_package = package.into();
        self
    }

    /// Add a model include in `path:glob` form.
    pub fn include(mut self, include: &str) -> Self {
        self.includes.push(Include::parse(include));
        self
    }

    /// Identity of the named schema `name` in the specification document.
    pub fn spec_component(&self, name: &str) -> Result<Option<ComponentReference>, ConfigError> {
        let Some(spec) = &self.spec else {
            return Ok(None);
        };
        let root = self.roots.specification();
        let relative = spec.strip_prefix(root).unwrap_or(spec);
        let module = relative
            .file_name()
            .map(|m| m.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = relative
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        ComponentReference::new(
            &format!("{}/{}", COMPONENTS_SCHEMAS, name),
            &module,
            &path,
            root,
        )
        .map(Some)
    }

    /// Package of the type identified by `id`.
    pub fn package_for(&self, id: &ComponentReference) -> String {
        if self.roots.is_specification_rooted(id.root_path()) {
            id.package(&self.spec_package)
        } else {
            id.package(&self.model_package)
        }
    }
}
