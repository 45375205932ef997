//! Template engine based on MiniJinja

use indexmap::IndexMap;
use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value};
use modlint_core::{Module, RenderContext};
use serde::Deserialize;
use std::path::Path;

use crate::error::{EngineError, RenderReport, Result, TemplateError};
use crate::filters;
use crate::functions;

/// Report key for failures not tied to a single template
pub const MODULE_REPORT_KEY: &str = "<module>";

/// Result of rendering a module
#[derive(Debug, Default)]
pub struct RenderResult {
    /// Rendered manifests by template name, in template order
    pub manifests: IndexMap<String, String>,

    /// Rendered NOTES.txt, if the module has one
    pub notes: Option<String>,
}

/// Rendered manifests together with every error found
#[derive(Debug, Default)]
pub struct RenderResultWithReport {
    pub manifests: IndexMap<String, String>,

    pub notes: Option<String>,

    pub report: RenderReport,
}

impl RenderResultWithReport {
    pub fn is_success(&self) -> bool {
        !self.report.has_errors()
    }
}

/// Module templates parsed once, rendered against many contexts
pub struct ModuleTemplates {
    env: Environment<'static>,

    /// Template sources by name, in sorted file order
    sources: IndexMap<String, String>,

    /// Errors found while reading or parsing templates
    pub load_report: RenderReport,
}

impl ModuleTemplates {
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Template engine builder
pub struct EngineBuilder {
    strict_mode: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self { strict_mode: true }
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn build(self) -> Engine {
        Engine::new(self.strict_mode)
    }
}

/// The template engine
#[derive(Debug, Clone, Copy)]
pub struct Engine {
    strict_mode: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Engine {
    pub fn new(strict_mode: bool) -> Self {
        Self { strict_mode }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn is_strict(&self) -> bool {
        self.strict_mode
    }

    /// Create a configured MiniJinja environment
    fn create_environment(&self) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_debug(true);
        // manifests are YAML, never escaped
        env.set_auto_escape_callback(|_| AutoEscape::None);

        if self.strict_mode {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(UndefinedBehavior::Chainable);
        }

        env.add_filter("toyaml", filters::toyaml);
        env.add_filter("tojson", filters::tojson);
        env.add_filter("b64encode", filters::b64encode);
        env.add_filter("quote", filters::quote);
        env.add_filter("squote", filters::squote);
        env.add_filter("indent", filters::indent);
        env.add_filter("nindent", filters::nindent);
        env.add_filter("required", filters::required);
        env.add_filter("trunc", filters::trunc);
        env.add_filter("sha256", filters::sha256);

        env.add_function("fail", functions::fail);
        env.add_function("dict", functions::dict);
        env.add_function("list", functions::list);
        env.add_function("coalesce", functions::coalesce);
        env.add_function("ternary", functions::ternary);

        env
    }

    /// Render a single template string
    pub fn render_string(
        &self,
        template: &str,
        context: &RenderContext,
        template_name: &str,
    ) -> Result<String> {
        let mut env = self.create_environment();
        let ctx_json = context.to_json();

        env.add_template_owned(template_name.to_string(), template.to_string())
            .map_err(|e| {
                EngineError::Template(TemplateError::from_minijinja(
                    e,
                    template_name,
                    template,
                    Some(&ctx_json),
                ))
            })?;

        let tmpl = env.get_template(template_name).map_err(|e| {
            EngineError::Template(TemplateError::from_minijinja(
                e,
                template_name,
                template,
                Some(&ctx_json),
            ))
        })?;

        tmpl.render(Value::from_serialize(&ctx_json)).map_err(|e| {
            EngineError::Template(TemplateError::from_minijinja(
                e,
                template_name,
                template,
                Some(&ctx_json),
            ))
        })
    }

    /// Read and parse every template of a module
    ///
    /// Unreadable or unparsable templates are recorded in the load report;
    /// only a failure to list the templates directory is returned as an error.
    pub fn load_module(&self, module: &Module) -> Result<ModuleTemplates> {
        let template_files = module.template_files()?;

        let mut env = self.create_environment();
        let mut sources = IndexMap::new();
        let mut load_report = RenderReport::new();

        for file_path in &template_files {
            let template_name = template_name(&module.templates_dir, file_path);

            let content = match std::fs::read_to_string(file_path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(template = %template_name, error = %e, "cannot read template");
                    load_report.add_error(
                        template_name,
                        TemplateError::simple(format!("Failed to read template: {}", e)),
                    );
                    continue;
                }
            };

            if let Err(e) = env.add_template_owned(template_name.clone(), content.clone()) {
                load_report.add_error(
                    template_name.clone(),
                    TemplateError::from_minijinja(e, &template_name, &content, None),
                );
            }
            sources.insert(template_name, content);
        }

        tracing::debug!(
            module = %module.name,
            templates = sources.len(),
            errors = load_report.total_errors,
            "loaded module templates"
        );

        Ok(ModuleTemplates {
            env,
            sources,
            load_report,
        })
    }

    /// Render loaded templates against one context, collecting all errors
    ///
    /// Load errors are not repeated here; they live in
    /// [`ModuleTemplates::load_report`].
    pub fn render_loaded(
        &self,
        templates: &ModuleTemplates,
        context: &RenderContext,
    ) -> RenderResultWithReport {
        let mut result = RenderResultWithReport::default();
        let ctx_json = context.to_json();
        let ctx = Value::from_serialize(&ctx_json);

        for (template_name, source) in &templates.sources {
            if is_helper(template_name) {
                continue;
            }

            // Parse failures are already in the load report
            let Ok(tmpl) = templates.env.get_template(template_name) else {
                continue;
            };

            let rendered = match tmpl.render(&ctx) {
                Ok(rendered) => rendered,
                Err(e) => {
                    result.report.add_error(
                        template_name.clone(),
                        TemplateError::from_minijinja(e, template_name, source, Some(&ctx_json)),
                    );
                    continue;
                }
            };

            if is_notes(template_name) {
                result.notes = Some(rendered);
                result.report.add_success(template_name.clone());
                continue;
            }

            let trimmed = rendered.trim();
            if trimmed.is_empty() || trimmed == "---" {
                result.report.add_success(template_name.clone());
                continue;
            }

            if is_yaml(template_name) {
                if let Err(e) = validate_yaml(&rendered) {
                    result.report.add_error(
                        template_name.clone(),
                        TemplateError::from_yaml(&e, template_name, &rendered),
                    );
                    continue;
                }
            }

            result.report.add_success(template_name.clone());
            result.manifests.insert(template_name.clone(), rendered);
        }

        result
    }

    /// Render all templates of a module, stopping at the first error
    pub fn render_module(&self, module: &Module, context: &RenderContext) -> Result<RenderResult> {
        let result = self.render_module_collect_errors(module, context);

        if let Some(first) = result.report.errors_by_template.into_values().flatten().next() {
            return Err(EngineError::Template(first));
        }

        Ok(RenderResult {
            manifests: result.manifests,
            notes: result.notes,
        })
    }

    /// Render all templates of a module, collecting all errors instead of
    /// stopping at the first
    pub fn render_module_collect_errors(
        &self,
        module: &Module,
        context: &RenderContext,
    ) -> RenderResultWithReport {
        let templates = match self.load_module(module) {
            Ok(templates) => templates,
            Err(e) => {
                let mut result = RenderResultWithReport::default();
                result.report.add_error(
                    MODULE_REPORT_KEY.to_string(),
                    TemplateError::simple(format!("Failed to list templates: {}", e)),
                );
                return result;
            }
        };

        let mut result = self.render_loaded(&templates, context);
        let mut report = templates.load_report;
        report.merge(result.report);
        result.report = report;
        result
    }
}

/// Template name: path relative to `templates/`, with `/` separators
fn template_name(templates_dir: &Path, file_path: &Path) -> String {
    file_path
        .strip_prefix(templates_dir)
        .unwrap_or(file_path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn file_name(template_name: &str) -> &str {
    template_name.rsplit('/').next().unwrap_or(template_name)
}

/// Helpers (`_helpers.tpl`) are loaded for imports but never rendered
fn is_helper(template_name: &str) -> bool {
    file_name(template_name).starts_with('_')
}

fn is_notes(template_name: &str) -> bool {
    file_name(template_name).eq_ignore_ascii_case("NOTES.txt")
}

fn is_yaml(template_name: &str) -> bool {
    template_name.ends_with(".yaml") || template_name.ends_with(".yml")
}

/// Check a rendered manifest parses as a YAML stream
fn validate_yaml(rendered: &str) -> std::result::Result<(), serde_yaml::Error> {
    for document in serde_yaml::Deserializer::from_str(rendered) {
        serde_yaml::Value::deserialize(document)?;
    }
    Ok(())
}
