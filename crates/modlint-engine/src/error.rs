//! Engine error types with diagnostic formatting

use indexmap::IndexMap;
use miette::{Diagnostic, NamedSource, SourceSpan};
use modlint_core::CoreError;
use thiserror::Error;

use crate::suggestions::{
    AVAILABLE_FILTERS, suggest_for_path, suggest_unknown_filter, suggest_unknown_function,
};

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Template error")]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    UnknownFunction,
    SyntaxError,
    TypeError,
    InvalidOperation,
    YamlParseError,
    Other,
}

impl TemplateErrorKind {
    /// Convert to a code string for diagnostics
    pub fn to_code_string(&self) -> &'static str {
        match self {
            Self::UndefinedVariable => "undefined_variable",
            Self::UnknownFilter => "unknown_filter",
            Self::UnknownFunction => "unknown_function",
            Self::SyntaxError => "syntax",
            Self::TypeError => "type",
            Self::InvalidOperation => "invalid_operation",
            Self::YamlParseError => "yaml_parse",
            Self::Other => "render",
        }
    }
}

/// Template-specific error with source information
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(modlint::template::render))]
pub struct TemplateError {
    pub message: String,

    pub kind: TemplateErrorKind,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    #[help]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Create a template error from a MiniJinja error
    ///
    /// `context` is the rendering context; when present, undefined-variable
    /// errors get a hint about where the lookup stopped resolving.
    pub fn from_minijinja(
        err: minijinja::Error,
        template_name: &str,
        template_source: &str,
        context: Option<&serde_json::Value>,
    ) -> Self {
        let kind = categorize(&err);
        let detailed = format!("{:#}", err);
        let expr = error_line_expression(&detailed);

        let message = match (kind, &expr) {
            (TemplateErrorKind::UndefinedVariable, Some(expr)) => {
                format!("undefined variable `{}`", expr.split('|').next().unwrap_or(expr).trim())
            }
            _ => err
                .to_string()
                .replace("invalid operation: ", "")
                .replace("syntax error: ", "")
                .replace("undefined value", "undefined variable"),
        };

        let suggestion = match kind {
            TemplateErrorKind::UndefinedVariable => expr.as_deref().and_then(|e| {
                let path = e.split('|').next().unwrap_or(e).trim();
                context.and_then(|ctx| suggest_for_path(path, ctx))
            }),
            TemplateErrorKind::UnknownFilter => expr
                .as_deref()
                .and_then(|e| e.rsplit('|').next())
                .and_then(|f| f.split(|c: char| c == '(' || c.is_whitespace()).find(|s| !s.is_empty()))
                .and_then(suggest_unknown_filter)
                .or_else(|| Some(format!("Available filters: {}", AVAILABLE_FILTERS.join(", ")))),
            TemplateErrorKind::UnknownFunction => expr
                .as_deref()
                .and_then(|e| e.split('(').next())
                .map(str::trim)
                .and_then(suggest_unknown_function),
            TemplateErrorKind::SyntaxError => Some(
                "Check bracket matching: `{{ }}` for expressions, `{% %}` for statements".to_string(),
            ),
            _ => None,
        };

        let span = err
            .line()
            .and_then(|line_num| line_span(template_source, line_num));

        Self {
            message,
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
            suggestion,
        }
    }

    /// A rendered manifest that is not valid YAML
    pub fn from_yaml(err: &serde_yaml::Error, template_name: &str, rendered: &str) -> Self {
        let span = err
            .location()
            .and_then(|loc| line_span(rendered, loc.line()));

        Self {
            message: format!("rendered manifest is not valid YAML: {}", err),
            kind: TemplateErrorKind::YamlParseError,
            src: NamedSource::new(template_name, rendered.to_string()),
            span,
            suggestion: Some(
                "Check indentation of included blocks (`nindent`) and quoting of values"
                    .to_string(),
            ),
        }
    }

    /// Create a simple error without source mapping
    pub fn simple(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TemplateErrorKind::Other,
            src: NamedSource::new("<unknown>", String::new()),
            span: None,
            suggestion: None,
        }
    }

    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

fn categorize(err: &minijinja::Error) -> TemplateErrorKind {
    match err.kind() {
        minijinja::ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
        minijinja::ErrorKind::UnknownFilter => TemplateErrorKind::UnknownFilter,
        minijinja::ErrorKind::UnknownFunction => TemplateErrorKind::UnknownFunction,
        minijinja::ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
        minijinja::ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
        minijinja::ErrorKind::NonPrimitive | minijinja::ErrorKind::NonKey => {
            TemplateErrorKind::TypeError
        }
        _ => TemplateErrorKind::Other,
    }
}

/// Expression inside `{{ }}` on the line MiniJinja marks with `>`
///
/// The detailed display looks like:
/// ```text
///    8 >   image: {{ Values.app.image }}
///      i            ^^^^^^^^^^^^^^^^ undefined value
/// ```
fn error_line_expression(display: &str) -> Option<String> {
    display
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            trimmed.contains(" > ") || trimmed.starts_with("> ")
        })
        .find_map(|line| {
            let start = line.find("{{")?;
            let end = line[start..].find("}}")?;
            let expr = line[start + 2..start + end].trim();
            (!expr.is_empty()).then(|| expr.to_string())
        })
}

/// Span covering one (1-based) line of the source
fn line_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;
    for (idx, line) in source.lines().enumerate() {
        if idx + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }
    None
}

/// Errors from rendering every template of a module once
#[derive(Debug, Default, Clone)]
pub struct RenderReport {
    /// Errors grouped by template file, in the order they were found
    pub errors_by_template: IndexMap<String, Vec<TemplateError>>,

    pub successful_templates: Vec<String>,

    pub total_errors: usize,
}

impl RenderReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, template_name: String, error: TemplateError) {
        self.errors_by_template
            .entry(template_name)
            .or_default()
            .push(error);
        self.total_errors += 1;
    }

    pub fn add_success(&mut self, template_name: String) {
        self.successful_templates.push(template_name);
    }

    /// Append another report, keeping template order
    pub fn merge(&mut self, other: RenderReport) {
        for (template_name, errors) in other.errors_by_template {
            self.total_errors += errors.len();
            self.errors_by_template
                .entry(template_name)
                .or_default()
                .extend(errors);
        }
        self.successful_templates.extend(other.successful_templates);
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    pub fn templates_with_errors(&self) -> usize {
        self.errors_by_template.len()
    }

    /// "5 errors in 3 templates"
    pub fn summary(&self) -> String {
        format!(
            "{} {} in {} {}",
            self.total_errors,
            plural(self.total_errors, "error"),
            self.templates_with_errors(),
            plural(self.templates_with_errors(), "template")
        )
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_report_new() {
        let report = RenderReport::new();
        assert!(!report.has_errors());
        assert_eq!(report.templates_with_errors(), 0);
        assert!(report.successful_templates.is_empty());
    }

    #[test]
    fn test_render_report_summary() {
        let mut report = RenderReport::new();
        report.add_error("a.yaml".into(), TemplateError::simple("one"));
        assert_eq!(report.summary(), "1 error in 1 template");

        report.add_error("a.yaml".into(), TemplateError::simple("two"));
        report.add_error("b.yaml".into(), TemplateError::simple("three"));
        assert_eq!(report.summary(), "3 errors in 2 templates");
        assert_eq!(
            report.errors_by_template.keys().collect::<Vec<_>>(),
            vec!["a.yaml", "b.yaml"]
        );
    }

    #[test]
    fn test_render_report_merge() {
        let mut load = RenderReport::new();
        load.add_error("bad.yaml".into(), TemplateError::simple("parse"));

        let mut render = RenderReport::new();
        render.add_error("other.yaml".into(), TemplateError::simple("undefined"));
        render.add_success("ok.yaml".into());

        load.merge(render);
        assert_eq!(load.total_errors, 2);
        assert_eq!(load.templates_with_errors(), 2);
        assert_eq!(load.successful_templates, vec!["ok.yaml"]);
    }

    #[test]
    fn test_line_span() {
        let source = "first\nsecond\nthird";
        let span = line_span(source, 2).unwrap();
        assert_eq!(span.offset(), 6);
        assert_eq!(span.len(), 6);
        assert!(line_span(source, 9).is_none());
    }

    #[test]
    fn test_error_line_expression() {
        let display = "   1 | a: b\n   2 >   image: {{ Values.app.image | quote }}\n     i   ^^^^ undefined value";
        assert_eq!(
            error_line_expression(display).as_deref(),
            Some("Values.app.image | quote")
        );
    }

    #[test]
    fn test_yaml_error() {
        let rendered = "a: b\n  c: d\n";
        let err = serde_yaml::from_str::<serde_yaml::Value>(rendered).unwrap_err();
        let te = TemplateError::from_yaml(&err, "deployment.yaml", rendered);
        assert_eq!(te.kind(), TemplateErrorKind::YamlParseError);
        assert!(te.message.contains("not valid YAML"));
    }
}
