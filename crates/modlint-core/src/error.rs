//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Module not found: {path}")]
    ModuleNotFound { path: String },

    #[error("Invalid module: {message}")]
    InvalidModule { message: String },

    #[error("Invalid schema {path}: {message}")]
    InvalidSchema { path: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Values merge error: {message}")]
    ValuesMerge { message: String },

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

/// Failures of a value synthesis run
///
/// The base case of synthesis cannot fail; these are raised by the
/// configured limits and propagate out of every enclosing recursive call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("schema nesting at `{path}` exceeds the maximum depth of {limit}")]
    DepthExceeded { path: String, limit: usize },

    #[error("schema expands to more than {limit} value documents")]
    TooManyDocuments { limit: usize },
}

pub type Result<T> = std::result::Result<T, CoreError>;
