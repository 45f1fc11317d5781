//! Canonical component identity.
//!
//! A [`ComponentReference`] names a component by the document it lives in
//! (root, relative path, module) and its position inside that document
//! (namespace, type name). Two references are equal iff their canonical
//! strings are equal:
//!
//! ```text
//! <root>/<path>/<module>#/<namespace>/<type name>
//! ```
//!
//! Two independently rooted trees take part in a run: the specification tree
//! and the model tree. [`Roots`] decides which of them owns the identity of a
//! referenced type.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::ConfigError;

/// Separator between the document part and the component part of a `$ref`.
const REF_SEPARATOR: &str = "#/";

/// Immutable, normalized reference to a component.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentReference {
    type_name: String,
    namespace: String,
    module: String,
    path: String,
    root_path: PathBuf,
    canonical: String,
}

impl ComponentReference {
    /// Build a reference, normalizing `path` against `root_path`.
    ///
    /// `root_path` must be absolute and `path` relative; navigational
    /// segments (`.`, `..`) are resolved lexically and the result must stay
    /// under the root. A `type_name` containing `/` is split into namespace
    /// and bare type name. The extension of `module` is dropped.
    pub fn new(
        type_name: &str,
        module: &str,
        path: &str,
        root_path: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let root_path = root_path.as_ref();
        if root_path.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(ConfigError::EmptyRoot);
        }
        if !root_path.is_absolute() {
            return Err(ConfigError::RelativeRoot {
                path: root_path.to_path_buf(),
            });
        }

        let path = path.trim();
        if Path::new(path).is_absolute() {
            return Err(ConfigError::AbsolutePath {
                path: path.to_string(),
            });
        }

        let root = clean_path(root_path);
        let relative = relative_to(&clean_path(&root.join(path)), &root)?;

        let type_name = type_name.trim();
        let (namespace, type_name) = match type_name.rsplit_once('/') {
            Some((namespace, name)) => (trim_path(namespace), name.trim()),
            None => (String::new(), type_name),
        };

        Ok(Self::from_parts(
            type_name.to_string(),
            namespace,
            trim_path(&remove_extension(module.trim())),
            relative,
            root,
        ))
    }

    fn from_parts(
        type_name: String,
        namespace: String,
        module: String,
        path: String,
        root_path: PathBuf,
    ) -> Self {
        let mut document = root_path.clone();
        for segment in [&path, &module] {
            if !segment.is_empty() {
                document.push(segment);
            }
        }
        let canonical = format!(
            "{}{}{}",
            document.display(),
            REF_SEPARATOR,
            join_segments(&namespace, &type_name)
        );

        Self {
            type_name,
            namespace,
            module,
            path,
            root_path,
            canonical,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Path relative to [`root_path`](Self::root_path), `/`-separated.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// The canonical identity string, the registry key.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Absolute path of the owning document without its extension.
    pub fn document_path(&self) -> PathBuf {
        let mut document = self.root_path.clone();
        for segment in [&self.path, &self.module] {
            if !segment.is_empty() {
                document.push(segment);
            }
        }
        document
    }

    /// JSON Pointer fragment of the component inside its document.
    pub fn fragment(&self) -> String {
        format!(
            "{}{}",
            REF_SEPARATOR,
            join_segments(&self.namespace, &self.type_name)
        )
    }

    /// `path/module` relative to the root.
    pub fn relative_module_path(&self) -> String {
        join_segments(&self.path, &self.module)
    }

    /// Package of the component under `base`: the base joined with the
    /// relative path, lower-cased.
    pub fn package(&self, base: &str) -> String {
        join_segments(base.trim_end_matches('/'), &self.path).to_lowercase()
    }

    pub fn is_on_root_path(&self, root: &Path) -> bool {
        self.root_path == clean_path(root)
    }

    /// Identity nested under this one: the current namespace and type name
    /// become the namespace, `segment` the type name.
    pub fn with_appended_type_name(&self, segment: &str) -> Self {
        Self::from_parts(
            segment.trim().to_string(),
            join_segments(&self.namespace, &self.type_name),
            self.module.clone(),
            self.path.clone(),
            self.root_path.clone(),
        )
    }

    /// Resolve a `$ref` string found in this component's document.
    ///
    /// The document part is relative to this component's document directory;
    /// an internal ref (`#/...`) stays in this document. The resulting
    /// identity is rooted according to [`Roots::select`].
    pub fn resolve_reference(
        &self,
        reference: &str,
        roots: &Roots,
    ) -> Result<ComponentReference, ConfigError> {
        let Some((document, component)) = reference.trim().split_once(REF_SEPARATOR) else {
            return Err(ConfigError::InvalidReference {
                reference: reference.to_string(),
            });
        };
        if component.trim().is_empty() {
            return Err(ConfigError::InvalidReference {
                reference: reference.to_string(),
            });
        }

        let (directory, module) = if document.trim().is_empty() {
            (self.root_path.join(&self.path), self.module.clone())
        } else {
            let target = clean_path(&self.root_path.join(&self.path).join(document.trim()));
            let module = target
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let directory = target
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| target.clone());
            (directory, module)
        };

        let directory = clean_path(&directory);
        let root = roots.select(&directory, self);
        let relative = relative_to(&directory, root)?;

        ComponentReference::new(component, &module, &relative, root)
    }
}

impl PartialEq for ComponentReference {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for ComponentReference {}

impl Hash for ComponentReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for ComponentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// The two document roots of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    specification: PathBuf,
    model: PathBuf,
}

impl Roots {
    /// Both roots must be absolute.
    pub fn new(
        specification: impl AsRef<Path>,
        model: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            specification: absolute_root(specification.as_ref())?,
            model: absolute_root(model.as_ref())?,
        })
    }

    pub fn specification(&self) -> &Path {
        &self.specification
    }

    pub fn model(&self) -> &Path {
        &self.model
    }

    /// Whether `path` belongs to the specification tree.
    ///
    /// When both roots contain the path the longer (more specific) root wins.
    pub fn is_specification_rooted(&self, path: &Path) -> bool {
        let path = clean_path(path);
        if path.starts_with(&self.model) {
            if path.starts_with(&self.specification) {
                return self.specification.as_os_str().len() > self.model.as_os_str().len();
            }
            return false;
        }
        path.starts_with(&self.specification)
    }

    /// Root that owns the identity of a target at `target` referenced from
    /// `referrer`.
    ///
    /// A target under the specification tree keeps the specification root
    /// when referenced from a specification-rooted component; referenced
    /// from a model-rooted component it switches to the model root, provided
    /// the model root contains it. The reverse case is symmetric. A target
    /// contained by only one root always takes that root.
    pub fn select(&self, target: &Path, referrer: &ComponentReference) -> &Path {
        let referrer_is_spec = self.is_specification_rooted(referrer.root_path());
        match (self.is_specification_rooted(target), referrer_is_spec) {
            (true, true) | (false, false) => self.owner(target),
            (true, false) if target.starts_with(&self.model) => &self.model,
            (false, true) if target.starts_with(&self.specification) => &self.specification,
            _ => self.owner(target),
        }
    }

    fn owner(&self, target: &Path) -> &Path {
        if self.is_specification_rooted(target) {
            &self.specification
        } else {
            &self.model
        }
    }
}

fn absolute_root(root: &Path) -> Result<PathBuf, ConfigError> {
    if root.as_os_str().to_string_lossy().trim().is_empty() {
        return Err(ConfigError::EmptyRoot);
    }
    if !root.is_absolute() {
        return Err(ConfigError::RelativeRoot {
            path: root.to_path_buf(),
        });
    }
    Ok(clean_path(root))
}

/// Lexically normalize a path: drop `.`, resolve `..` against the preceding
/// segment. `..` at the filesystem root stays at the root.
pub(crate) fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// `/`-separated path of `path` relative to `root`.
fn relative_to(path: &Path, root: &Path) -> Result<String, ConfigError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ConfigError::EscapesRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(segments.join("/"))
}

/// Strip leading `./` and `/`, trailing `/` and surrounding spaces.
fn trim_path(path: &str) -> String {
    let path = path.strip_prefix("./").unwrap_or(path);
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    path.trim().to_string()
}

fn remove_extension(filename: &str) -> String {
    match Path::new(filename).extension() {
        Some(ext) => filename
            .strip_suffix(&format!(".{}", ext.to_string_lossy()))
            .unwrap_or(filename)
            .to_string(),
        None => filename.to_string(),
    }
}

fn join_segments(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_string(),
        (false, true) => first.to_string(),
        (false, false) => format!("{}/{}", first, second),
    }
}
