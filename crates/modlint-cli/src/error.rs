//! CLI error types with exit code handling

use miette::Diagnostic;
use modlint_core::{CoreError, SynthesisError};
use modlint_engine::EngineError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Module directory, Chart.yaml or schema could not be loaded
    #[error("Module error: {message}")]
    #[diagnostic(code(modlint::cli::module))]
    Module {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Synthesis failed: {message}")]
    #[diagnostic(
        code(modlint::cli::synthesis),
        help("Raise the limit with --max-depth / --max-documents or in .modlint.yaml")
    )]
    Synthesis { message: String },

    /// A template error outside of a lint run
    #[error("Template error: {message}")]
    #[diagnostic(code(modlint::cli::template))]
    Template { message: String },

    #[error("Linting failed with {errors} error(s) in {documents} values document(s)")]
    #[diagnostic(code(modlint::cli::lint))]
    LintFailed { errors: usize, documents: usize },

    #[error("IO error: {message}")]
    #[diagnostic(code(modlint::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(modlint::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Module { .. } => exit_codes::MODULE_ERROR,
            CliError::Synthesis { .. } => exit_codes::SYNTHESIS_ERROR,
            CliError::Template { .. } => exit_codes::ERROR,
            CliError::LintFailed { .. } => exit_codes::ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn lint_failed(errors: usize, documents: usize) -> Self {
        Self::LintFailed { errors, documents }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Synthesis(e) => e.into(),
            CoreError::Io(e) => e.into(),
            missing @ CoreError::ModuleNotFound { .. } => CliError::Module {
                message: missing.to_string(),
                help: Some("Pass the path of a module directory".to_string()),
            },
            other => CliError::Module {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

impl From<SynthesisError> for CliError {
    fn from(err: SynthesisError) -> Self {
        CliError::Synthesis {
            message: err.to_string(),
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(e) => e.into(),
            EngineError::Io(e) => e.into(),
            EngineError::Template(e) => CliError::Template { message: e.message },
            EngineError::Json(e) => e.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Other {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::Other {
            message: format!("YAML error: {}", err),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
