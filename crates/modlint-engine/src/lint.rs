//! Lint driver: one render per synthesized values document

use indexmap::IndexMap;
use modlint_core::{CoreError, LintConfig, Module, RenderContext};
use serde_json::Value as JsonValue;

use crate::engine::Engine;
use crate::error::{RenderReport, Result};

/// Outcome of rendering the module against one values document
#[derive(Debug)]
pub struct DocumentOutcome {
    /// Position of the document in synthesis order
    pub index: usize,

    /// The module values document that was rendered
    pub values: JsonValue,

    pub manifests: IndexMap<String, String>,

    pub report: RenderReport,
}

impl DocumentOutcome {
    pub fn is_success(&self) -> bool {
        !self.report.has_errors()
    }
}

/// Result of linting a module
#[derive(Debug)]
pub struct LintReport {
    pub module: String,

    /// Template read and parse errors, shared by every document
    pub load_report: RenderReport,

    pub outcomes: Vec<DocumentOutcome>,
}

impl LintReport {
    pub fn total_errors(&self) -> usize {
        self.load_report.total_errors
            + self
                .outcomes
                .iter()
                .map(|o| o.report.total_errors)
                .sum::<usize>()
    }

    pub fn is_success(&self) -> bool {
        self.total_errors() == 0
    }

    pub fn failed_documents(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Renders a module against every values document its schema admits
pub struct Linter {
    engine: Engine,
    config: LintConfig,
}

impl Linter {
    pub fn new(config: LintConfig) -> Self {
        Self {
            engine: Engine::builder().strict(config.strict).build(),
            config,
        }
    }

    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Module values documents to render
    ///
    /// Without a schema, or when synthesis yields nothing, a single empty
    /// document is returned so templates are still rendered once.
    pub fn values_documents(&self, module: &Module) -> Result<Vec<JsonValue>> {
        let Some(schema) = module.effective_schema()? else {
            tracing::debug!(module = %module.name, "no values schema, rendering once");
            return Ok(vec![empty_document()]);
        };

        let documents = self
            .config
            .synthesizer()
            .synthesize(&schema)
            .map_err(CoreError::from)?;

        tracing::debug!(
            module = %module.name,
            documents = documents.len(),
            "synthesized values documents"
        );

        if documents.is_empty() {
            Ok(vec![empty_document()])
        } else {
            Ok(documents)
        }
    }

    pub fn lint(&self, module: &Module) -> Result<LintReport> {
        let documents = self.values_documents(module)?;
        let digests = module.image_digests()?;
        let templates = self.engine.load_module(module)?;

        if templates.is_empty() {
            tracing::warn!(module = %module.name, "module has no templates");
        }

        let mut outcomes = Vec::with_capacity(documents.len());
        for (index, values) in documents.into_iter().enumerate() {
            let context = RenderContext::for_module(module, &self.config, values.clone(), &digests)?;
            let rendered = self.engine.render_loaded(&templates, &context);

            tracing::debug!(
                module = %module.name,
                document = index,
                manifests = rendered.manifests.len(),
                errors = rendered.report.total_errors,
                "rendered values document"
            );

            outcomes.push(DocumentOutcome {
                index,
                values,
                manifests: rendered.manifests,
                report: rendered.report,
            });
        }

        Ok(LintReport {
            module: module.name.clone(),
            load_report: templates.load_report,
            outcomes,
        })
    }
}

fn empty_document() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}
