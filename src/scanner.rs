//! Model discovery.
//!
//! Walks the model root for documents matching the configured includes and
//! lists the top-level objects each one defines.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, GenerateError};
use crate::loader::{load_document, DOCUMENT_EXTENSIONS};
use crate::types::Include;

/// A model document and the names of its top-level objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Document path relative to the model root, `/`-separated.
    pub path: String,
    pub objects: Vec<String>,
}

impl Module {
    /// `$ref` string of `object` relative to the model root.
    pub fn to_ref(&self, object: &str) -> String {
        format!("{}#/{}", self.path, object)
    }
}

/// Scan `model_root` for every include and return the matching modules,
/// sorted by path. Documents listed in `exclude` are skipped.
pub fn scan_models(
    model_root: &Path,
    includes: &[Include],
    exclude: &[PathBuf],
) -> Result<Vec<Module>, GenerateError> {
    let mut files = Vec::new();

    for include in includes {
        let matcher = compile_glob(&include.glob)?;
        let directory = model_root.join(&include.path);
        let mut candidates = Vec::new();
        collect_files_recursive(&directory, &mut candidates);

        for file in candidates {
            let Ok(relative) = file.strip_prefix(&directory) else {
                continue;
            };
            if matcher.is_match(relative) && !files.contains(&file) && !exclude.contains(&file) {
                files.push(file);
            }
        }
    }
    files.sort();

    let mut modules = Vec::new();
    for file in files {
        let document = load_document(&file)?;
        let objects: Vec<String> = match &document {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        let path = file
            .strip_prefix(model_root)
            .unwrap_or(&file)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");

        debug!(module = %path, objects = objects.len(), "scanned model");
        modules.push(Module { path, objects });
    }

    Ok(modules)
}

fn compile_glob(glob: &str) -> Result<GlobMatcher, ConfigError> {
    GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| ConfigError::InvalidGlob {
            glob: glob.to_string(),
            message: e.to_string(),
        })
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .map(|ext| DOCUMENT_EXTENSIONS.iter().any(|known| ext == *known))
        .unwrap_or(false)
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if is_document(&path) {
            files.push(path);
        }
    }
}
