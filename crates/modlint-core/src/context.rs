//! Template rendering context
//!
//! Mirrors Helm's top-level template objects. The module's values document
//! sits under `Values.<valuesKey>` next to `Values.global`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::config::LintConfig;
use crate::error::Result;
use crate::module::{ChartMetadata, Module};
use crate::values::Values;

/// Path of the injected image digests inside `Values.global`
pub const DIGESTS_PATH: &str = "modulesImages.digests";

/// Context available to all templates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RenderContext {
    pub values: JsonValue,

    pub release: ReleaseInfo,

    pub chart: ChartInfo,

    pub capabilities: Capabilities,
}

/// Release information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReleaseInfo {
    pub name: String,
    pub namespace: String,
    pub service: String,
    pub revision: u32,
    pub is_install: bool,
    pub is_upgrade: bool,
}

impl ReleaseInfo {
    pub fn for_install(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            service: "Helm".to_string(),
            revision: 1,
            is_install: true,
            is_upgrade: false,
        }
    }
}

/// Chart information for templates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChartInfo {
    pub name: String,
    pub version: String,
    pub app_version: Option<String>,
}

impl From<&ChartMetadata> for ChartInfo {
    fn from(meta: &ChartMetadata) -> Self {
        Self {
            name: meta.name.clone(),
            version: meta.version.to_string(),
            app_version: meta.app_version.clone(),
        }
    }
}

/// Cluster capabilities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Capabilities {
    pub kube_version: KubeVersion,

    #[serde(rename = "APIVersions")]
    pub api_versions: Vec<String>,
}

/// Kubernetes version info
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KubeVersion {
    pub version: String,
    pub major: String,
    pub minor: String,
    pub git_version: String,
}

impl Default for KubeVersion {
    fn default() -> Self {
        Self::new("v1.28.0")
    }
}

impl KubeVersion {
    pub fn new(version: &str) -> Self {
        let version = version.trim_start_matches('v');
        let parts: Vec<&str> = version.split('.').collect();

        Self {
            version: format!("v{}", version),
            major: parts.first().unwrap_or(&"1").to_string(),
            minor: parts.get(1).unwrap_or(&"28").to_string(),
            git_version: format!("v{}", version),
        }
    }
}

impl RenderContext {
    /// Build the context for one synthesized module values document
    pub fn for_module(
        module: &Module,
        config: &LintConfig,
        module_values: JsonValue,
        digests: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let mut global = Values(config.global_values.clone());
        if !global.inner().is_object() {
            global = Values::new();
        }

        let mut module_digests = serde_json::Map::new();
        module_digests.insert(
            module.values_key.clone(),
            serde_json::to_value(digests)?,
        );
        let mut injected = Values::new();
        injected.set(DIGESTS_PATH, JsonValue::Object(module_digests))?;
        global.merge(&injected);

        let mut values = serde_json::Map::new();
        values.insert("global".to_string(), global.into_inner());
        values.insert(module.values_key.clone(), module_values);

        let release = ReleaseInfo::for_install(
            &config.release_name_for(module),
            &config.namespace_for(module),
        );

        Ok(Self {
            values: JsonValue::Object(values),
            release,
            chart: ChartInfo::from(&module.chart),
            capabilities: Capabilities {
                kube_version: KubeVersion::new(&config.kube_version),
                api_versions: config.api_versions.clone(),
            },
        })
    }

    /// The module's own values document
    pub fn module_values(&self, module: &Module) -> Option<&JsonValue> {
        self.values.get(&module.values_key)
    }

    /// Convert to minijinja-compatible context
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn module(dir: &TempDir) -> Module {
        let root = dir.path().join("030-cert-manager");
        std::fs::create_dir(&root).unwrap();
        Module::load(&root).unwrap()
    }

    #[test]
    fn test_kube_version_parse() {
        let v = KubeVersion::new("1.30.2");
        assert_eq!(v.version, "v1.30.2");
        assert_eq!(v.major, "1");
        assert_eq!(v.minor, "30");
    }

    #[test]
    fn test_context_layout() {
        let dir = TempDir::new().unwrap();
        let module = module(&dir);
        let config = LintConfig {
            global_values: json!({"modulesImages": {"registry": {"base": "registry.local"}}}),
            ..Default::default()
        };
        let digests = BTreeMap::from([("controller".to_string(), "sha256:abc".to_string())]);

        let ctx =
            RenderContext::for_module(&module, &config, json!({"logLevel": "Info"}), &digests)
                .unwrap();
        let json = ctx.to_json();

        assert_eq!(json["Values"]["certManager"]["logLevel"], "Info");
        assert_eq!(
            json["Values"]["global"]["modulesImages"]["digests"]["certManager"]["controller"],
            "sha256:abc"
        );
        assert_eq!(
            json["Values"]["global"]["modulesImages"]["registry"]["base"],
            "registry.local"
        );
        assert_eq!(json["Release"]["Name"], "cert-manager");
        assert_eq!(json["Release"]["Namespace"], "d8-cert-manager");
        assert_eq!(json["Release"]["Service"], "Helm");
        assert_eq!(json["Chart"]["Name"], "cert-manager");
        assert_eq!(json["Capabilities"]["KubeVersion"]["Minor"], "28");
        assert!(json["Capabilities"]["APIVersions"].is_array());
        assert_eq!(ctx.module_values(&module), Some(&json!({"logLevel": "Info"})));
    }

    #[test]
    fn test_non_object_global_values_are_replaced() {
        let dir = TempDir::new().unwrap();
        let module = module(&dir);
        let config = LintConfig {
            global_values: JsonValue::Null,
            ..Default::default()
        };

        let ctx = RenderContext::for_module(&module, &config, json!({}), &BTreeMap::new()).unwrap();
        assert!(ctx.values["global"]["modulesImages"]["digests"]["certManager"].is_object());
    }
}
