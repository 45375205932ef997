//! Lint configuration
//!
//! Settings come from an optional `.modlint.yaml` in the module root and are
//! then overridden by command-line flags.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::Result;
use crate::module::Module;
use crate::synth::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_DOCUMENTS, Synthesizer};

/// Config file looked up in the module root
pub const CONFIG_FILE: &str = ".modlint.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LintConfig {
    /// Fail on undefined template variables
    pub strict: bool,

    /// Recursion limit for value synthesis
    pub max_depth: usize,

    /// Document cap for a single synthesis run
    pub max_documents: usize,

    /// Kubernetes version exposed as `Capabilities.KubeVersion`
    pub kube_version: String,

    /// `Release.Name`; defaults to the module name
    pub release_name: Option<String>,

    /// `Release.Namespace`; defaults to `d8-<module name>`
    pub namespace: Option<String>,

    /// Extra entries for `Capabilities.APIVersions`
    pub api_versions: Vec<String>,

    /// Base of `Values.global`
    pub global_values: JsonValue,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            strict: true,
            max_depth: DEFAULT_MAX_DEPTH,
            max_documents: DEFAULT_MAX_DOCUMENTS,
            kube_version: "v1.28.0".to_string(),
            release_name: None,
            namespace: None,
            api_versions: vec![],
            global_values: JsonValue::Object(serde_json::Map::new()),
        }
    }
}

impl LintConfig {
    /// Load `.modlint.yaml` from a module root, falling back to defaults
    pub fn load<P: AsRef<Path>>(module_root: P) -> Result<Self> {
        let path = module_root.as_ref().join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded lint config");
        Ok(config)
    }

    pub fn release_name_for(&self, module: &Module) -> String {
        self.release_name
            .clone()
            .unwrap_or_else(|| module.name.clone())
    }

    pub fn namespace_for(&self, module: &Module) -> String {
        self.namespace
            .clone()
            .unwrap_or_else(|| format!("d8-{}", module.name))
    }

    /// Synthesizer honoring the configured limits
    pub fn synthesizer(&self) -> Synthesizer {
        Synthesizer::builder()
            .max_depth(self.max_depth)
            .max_documents(self.max_documents)
            .build()
    }
}
