//! Error types for schema graph resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors: invalid roots, paths escaping their root, malformed refs.
///
/// These are raised while building identities and settings and are never
/// recoverable within a run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("root path must not be empty")]
    EmptyRoot,

    #[error("root path must be an absolute path: {path}")]
    RelativeRoot { path: PathBuf },

    #[error("path must be a relative path: {path}")]
    AbsolutePath { path: String },

    #[error("path '{path}' is above root path '{root}'")]
    EscapesRoot { path: PathBuf, root: PathBuf },

    #[error("specification document {path} is not under the specification root {root}")]
    SpecOutsideRoot { path: PathBuf, root: PathBuf },

    #[error("'{reference}' is not a valid component reference")]
    InvalidReference { reference: String },

    #[error("invalid include glob '{glob}': {message}")]
    InvalidGlob { glob: String, message: String },
}

/// Errors from the schema merge engine.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("cannot merge schemas that are not of type object (to: {to}, from: {from})")]
    NotObject { to: String, from: String },
}

/// Errors during specification generation.
///
/// Any of these aborts the whole run; there is no partial output.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("merge failed in component {component}: {source}")]
    Merge {
        component: String,
        #[source]
        source: MergeError,
    },

    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    InvalidYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("fragment {fragment} not found in {document}")]
    FragmentNotFound { document: PathBuf, fragment: String },

    #[error("invalid schema for component {component}: {source}")]
    InvalidSchema {
        component: String,
        #[source]
        source: serde_json::Error,
    },

    // Schema shape errors (exit code 2)
    #[error("discriminator not supported on object with properties (component: {component})")]
    DiscriminatorWithProperties { component: String },

    #[error("discriminator not supported on object with allOf (component: {component})")]
    DiscriminatorWithAllOf { component: String },

    #[error("discriminator not supported on object with anyOf (component: {component})")]
    DiscriminatorWithAnyOf { component: String },

    #[error("discriminator key '{key}' already maps to {existing}, cannot also map {target} (component: {component})")]
    AmbiguousMapping {
        component: String,
        key: String,
        existing: String,
        target: String,
    },

    #[error("variant {target} has multiple discriminator keys: {} (component: {component})", keys.join(", "))]
    DuplicateMappingKeys {
        component: String,
        target: String,
        keys: Vec<String>,
    },

    #[error("discriminator key '{key}' maps to {target} which is not a oneOf variant (component: {component})")]
    MappingTargetNotInUnion {
        component: String,
        key: String,
        target: String,
    },

    #[error("reference {reference} does not resolve to a registered component")]
    DanglingReference { reference: String },

    #[error("reference chain starting at {reference} never reaches a definition")]
    UnterminatedReference { reference: String },

    #[error("identity {id} is already registered for another component (variant of {target})")]
    IdentityConflict { id: String, target: String },

    #[error("no top-level component named '{name}'")]
    UnknownComponent { name: String },
}

impl GenerateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            GenerateError::FileNotFound { .. } | GenerateError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}
