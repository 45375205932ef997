//! CLI commands

pub mod lint;
pub mod schema;
pub mod values;

use clap::Args;
use modlint_core::{LintConfig, Module};
use std::path::Path;

use crate::error::Result;

/// Synthesis limits, overriding `.modlint.yaml`
#[derive(Args, Debug, Default)]
pub struct SynthesisArgs {
    /// Maximum schema nesting depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Maximum number of values documents
    #[arg(long)]
    pub max_documents: Option<usize>,
}

impl SynthesisArgs {
    pub fn apply(&self, config: &mut LintConfig) {
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(max_documents) = self.max_documents {
            config.max_documents = max_documents;
        }
    }
}

/// Render settings, overriding `.modlint.yaml`
#[derive(Args, Debug, Default)]
pub struct RenderArgs {
    /// Fail on undefined template variables
    #[arg(long, conflicts_with = "lenient")]
    pub strict: bool,

    /// Render undefined template variables as empty
    #[arg(long)]
    pub lenient: bool,

    /// Kubernetes version exposed as Capabilities.KubeVersion
    #[arg(long)]
    pub kube_version: Option<String>,

    /// Release namespace (default: d8-<module>)
    #[arg(short, long)]
    pub namespace: Option<String>,
}

impl RenderArgs {
    pub fn apply(&self, config: &mut LintConfig) {
        if self.strict {
            config.strict = true;
        }
        if self.lenient {
            config.strict = false;
        }
        if let Some(kube_version) = &self.kube_version {
            config.kube_version = kube_version.clone();
        }
        if let Some(namespace) = &self.namespace {
            config.namespace = Some(namespace.clone());
        }
    }
}

/// Load the module and its `.modlint.yaml`
pub fn load_module(path: &Path) -> Result<(Module, LintConfig)> {
    let module = Module::load(path)?;
    let config = LintConfig::load(&module.root)?;
    tracing::debug!(module = %module.name, values_key = %module.values_key, "loaded module");
    Ok((module, config))
}
