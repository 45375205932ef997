//! modlint engine - template rendering and the lint driver
//!
//! This crate provides:
//! - A MiniJinja-based engine with Helm-compatible filters and functions
//! - Multi-error collection with miette diagnostics and suggestions
//! - YAML validation of rendered manifests
//! - The `Linter`, rendering a module once per synthesized values document

pub mod engine;
pub mod error;
pub mod filters;
pub mod functions;
pub mod lint;
pub mod suggestions;

pub use engine::{Engine, EngineBuilder, ModuleTemplates, RenderResult, RenderResultWithReport};
pub use error::{EngineError, RenderReport, TemplateError, TemplateErrorKind};
pub use lint::{DocumentOutcome, LintReport, Linter};
pub use suggestions::{AVAILABLE_FILTERS, AVAILABLE_FUNCTIONS};
