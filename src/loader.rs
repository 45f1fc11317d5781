//! Document loading.
//!
//! Loads specification and model documents (YAML or JSON) and hands out the
//! schema nodes that component identities point at.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::GenerateError;

/// Extensions probed, in order, when locating a document by its
/// extension-less path.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Source of schema nodes for a generation run.
pub trait SchemaSource {
    /// The node at `fragment` (e.g. `#/components/schemas/Pet`) inside the
    /// document at `document` (absolute, without extension).
    fn load_node(&mut self, document: &Path, fragment: &str) -> Result<Value, GenerateError>;
}

/// Load a document from a file path.
///
/// `.yaml`/`.yml` files are parsed as YAML, everything else as JSON.
///
/// # Errors
///
/// Returns `GenerateError::FileNotFound` if the file doesn't exist,
/// or `InvalidJson`/`InvalidYaml` if it doesn't parse.
pub fn load_document(path: &Path) -> Result<Value, GenerateError> {
    if !path.exists() {
        return Err(GenerateError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| GenerateError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|source| GenerateError::InvalidYaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&content).map_err(|source| GenerateError::InvalidJson {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false)
}

/// Navigate a JSON Pointer fragment (e.g., "#/components/schemas/Pet").
///
/// Returns `None` when any segment is missing.
pub fn navigate_fragment<'a>(document: &'a Value, fragment: &str) -> Option<&'a Value> {
    // Remove leading # and split by /
    let path = fragment.trim_start_matches('#').trim_start_matches('/');
    if path.is_empty() {
        return Some(document);
    }

    let mut current = document;
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            other => other.get(&key)?,
        };
    }
    Some(current)
}

/// Caching [`SchemaSource`] over files on disk.
///
/// Documents are keyed by their absolute path without extension, the form
/// component identities carry. Documents can also be inserted up front,
/// which is how in-memory specifications are fed to a run.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<PathBuf, Value>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parsed document at `path`; its extension, if any, is ignored.
    pub fn insert(&mut self, path: impl AsRef<Path>, document: Value) {
        self.documents.insert(document_key(path.as_ref()), document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The document at `path`, loading it from disk on first use.
    pub fn document(&mut self, path: &Path) -> Result<&Value, GenerateError> {
        let key = document_key(path);
        if !self.documents.contains_key(&key) {
            let file = locate_document(path)?;
            debug!(file = %file.display(), "loading document");
            let document = load_document(&file)?;
            self.documents.insert(key.clone(), document);
        }

        self.documents
            .get(&key)
            .ok_or_else(|| GenerateError::FileNotFound { path: key.clone() })
    }
}

impl SchemaSource for DocumentStore {
    fn load_node(&mut self, document: &Path, fragment: &str) -> Result<Value, GenerateError> {
        let root = self.document(document)?;
        navigate_fragment(root, fragment)
            .cloned()
            .ok_or_else(|| GenerateError::FragmentNotFound {
                document: document.to_path_buf(),
                fragment: fragment.to_string(),
            })
    }
}

fn document_key(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if DOCUMENT_EXTENSIONS.iter().any(|known| ext == *known) => {
            path.with_extension("")
        }
        _ => path.to_path_buf(),
    }
}

/// Find the file behind `path`: the path itself when it exists as a file,
/// otherwise the first known extension that does.
fn locate_document(path: &Path) -> Result<PathBuf, GenerateError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    let key = document_key(path);
    DOCUMENT_EXTENSIONS
        .iter()
        .map(|ext| {
            let mut file = key.clone().into_os_string();
            file.push(".");
            file.push(ext);
            PathBuf::from(file)
        })
        .find(|file| file.is_file())
        .ok_or_else(|| GenerateError::FileNotFound {
            path: path.to_path_buf(),
        })
}
