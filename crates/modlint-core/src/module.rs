//! Module loading
//!
//! A module is a Helm chart directory with its values schemas under
//! `openapi/`:
//!
//! ```text
//! 040-node-manager/
//! ├── Chart.yaml
//! ├── openapi/
//! │   ├── config-values.yaml   # public configuration schema
//! │   └── values.yaml          # internal values, extends config-values
//! ├── templates/
//! └── images/                  # one directory per container image
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::schema::Schema;
use crate::transform::TransformPipeline;

static ORDER_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+-").expect("valid regex"));

const CONFIG_VALUES_FILES: [&str; 2] = ["config-values.yaml", "config-values.json"];
const VALUES_FILES: [&str; 2] = ["values.yaml", "values.json"];

/// Chart.yaml contents relevant to rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub name: String,

    #[serde(with = "version_serde")]
    pub version: Version,

    #[serde(default)]
    pub app_version: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// A module directory with resolved paths
#[derive(Debug, Clone)]
pub struct Module {
    /// Module name without the ordering prefix (`node-manager`)
    pub name: String,

    /// Key of the module's section in `Values` (`nodeManager`)
    pub values_key: String,

    pub chart: ChartMetadata,

    pub root: PathBuf,

    pub templates_dir: PathBuf,

    pub openapi_dir: PathBuf,

    pub images_dir: PathBuf,
}

impl Module {
    /// Load a module from a directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();

        if !root.is_dir() {
            return Err(CoreError::ModuleNotFound {
                path: root.display().to_string(),
            });
        }

        let dir_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let dir_module_name = module_name_from_dir(&dir_name);

        let chart_file = root.join("Chart.yaml");
        let chart = if chart_file.exists() {
            let content = std::fs::read_to_string(&chart_file)?;
            serde_yaml::from_str::<ChartMetadata>(&content)?
        } else {
            ChartMetadata {
                name: dir_module_name.clone(),
                version: Version::new(0, 0, 0),
                app_version: None,
                description: None,
            }
        };

        let name = if chart.name.is_empty() {
            dir_module_name
        } else {
            chart.name.clone()
        };
        if name.is_empty() {
            return Err(CoreError::InvalidModule {
                message: format!("cannot determine module name for {}", root.display()),
            });
        }

        Ok(Self {
            values_key: to_camel_case(&name),
            name,
            chart,
            templates_dir: root.join("templates"),
            openapi_dir: root.join("openapi"),
            images_dir: root.join("images"),
            root,
        })
    }

    /// Public configuration schema (`openapi/config-values.yaml`)
    pub fn config_values_schema(&self) -> Result<Option<Schema>> {
        self.load_openapi(&CONFIG_VALUES_FILES)
    }

    /// Internal values schema (`openapi/values.yaml`)
    pub fn values_schema(&self) -> Result<Option<Schema>> {
        self.load_openapi(&VALUES_FILES)
    }

    fn load_openapi(&self, candidates: &[&str]) -> Result<Option<Schema>> {
        for candidate in candidates {
            let path = self.openapi_dir.join(candidate);
            if path.exists() {
                return Ok(Some(Schema::from_file(&path)?));
            }
        }
        Ok(None)
    }

    /// The schema values are synthesized from, transforms applied
    ///
    /// `values.yaml` extended by `config-values.yaml` when both exist,
    /// otherwise whichever one exists.
    pub fn effective_schema(&self) -> Result<Option<Schema>> {
        let config_values = self.config_values_schema()?;
        let values = self.values_schema()?;

        let schema = match (values, config_values) {
            (Some(values), parent) => TransformPipeline::for_module(parent).apply(Some(values)),
            (None, config_values) => TransformPipeline::for_module(None).apply(config_values),
        };

        tracing::debug!(
            module = %self.name,
            found = schema.is_some(),
            "loaded module values schema"
        );
        Ok(schema)
    }

    /// Template files, sorted
    pub fn template_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        if !self.templates_dir.exists() {
            return Ok(files);
        }

        for entry in walkdir::WalkDir::new(&self.templates_dir)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() {
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy().to_lowercase();
                    if matches!(ext.as_str(), "yaml" | "yml" | "tpl" | "txt" | "json") {
                        files.push(path.to_path_buf());
                    }
                }
            }
        }

        files.sort();
        Ok(files)
    }

    /// Image names found under `images/`, camelCased, sorted
    pub fn image_names(&self) -> Result<Vec<String>> {
        if !self.images_dir.is_dir() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.images_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(to_camel_case(&entry.file_name().to_string_lossy()));
            }
        }
        names.sort();
        Ok(names)
    }

    /// Placeholder digests for every module image
    ///
    /// Digests are stable: derived from the module and image names.
    pub fn image_digests(&self) -> Result<BTreeMap<String, String>> {
        Ok(self
            .image_names()?
            .into_iter()
            .map(|image| {
                let digest = fake_digest(&self.values_key, &image);
                (image, digest)
            })
            .collect())
    }
}

/// Strip the ordering prefix of a module directory (`040-node-manager`)
pub fn module_name_from_dir(dir_name: &str) -> String {
    ORDER_PREFIX.replace(dir_name, "").to_string()
}

/// `node-manager` -> `nodeManager`
pub fn to_camel_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper_next = false;

    for c in name.chars() {
        if matches!(c, '-' | '_' | '.' | ' ') {
            upper_next = !result.is_empty();
        } else if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else if result.is_empty() {
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

fn fake_digest(module: &str, image: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}/{}", module, image).as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

mod version_serde {
    use semver::Version;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(version: &Version, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&version.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Version, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Version::parse(raw.trim_start_matches('v')).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_module_name_helpers() {
        assert_eq!(module_name_from_dir("040-node-manager"), "node-manager");
        assert_eq!(module_name_from_dir("cert-manager"), "cert-manager");
        assert_eq!(to_camel_case("node-manager"), "nodeManager");
        assert_eq!(to_camel_case("cni_cilium"), "cniCilium");
        assert_eq!(to_camel_case("Prometheus"), "prometheus");
        assert_eq!(to_camel_case("-leading"), "leading");
    }

    #[test]
    fn test_load_without_chart() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("110-ingress-nginx");
        fs::create_dir(&root).unwrap();

        let module = Module::load(&root).unwrap();
        assert_eq!(module.name, "ingress-nginx");
        assert_eq!(module.values_key, "ingressNginx");
        assert_eq!(module.chart.version, Version::new(0, 0, 0));
    }

    #[test]
    fn test_load_with_chart() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "Chart.yaml",
            "apiVersion: v2\nname: cert-manager\nversion: 1.2.3\nappVersion: v1.14\n",
        );

        let module = Module::load(dir.path()).unwrap();
        assert_eq!(module.name, "cert-manager");
        assert_eq!(module.values_key, "certManager");
        assert_eq!(module.chart.version, Version::new(1, 2, 3));
        assert_eq!(module.chart.app_version.as_deref(), Some("v1.14"));
    }

    #[test]
    fn test_load_missing_directory() {
        let err = Module::load("/nonexistent/module").unwrap_err();
        assert!(matches!(err, CoreError::ModuleNotFound { .. }));
    }

    #[test]
    fn test_effective_schema_extends_config_values() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "openapi/config-values.yaml",
            r#"
type: object
required: [logLevel]
properties:
  logLevel:
    type: string
    enum: [Debug, Info]
"#,
        );
        write(
            dir.path(),
            "openapi/values.yaml",
            r#"
x-extend:
  schema: config-values.yaml
type: object
x-required-for-helm: [internal]
properties:
  internal:
    type: object
    default: {}
    properties:
      ready:
        default: true
"#,
        );

        let module = Module::load(dir.path()).unwrap();
        let schema = module.effective_schema().unwrap().unwrap();

        assert_eq!(schema.required, vec!["logLevel", "internal"]);
        assert!(schema.properties.contains_key("logLevel"));
        assert!(schema.properties.contains_key("internal"));
    }

    #[test]
    fn test_effective_schema_config_values_only() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "openapi/config-values.yaml",
            "properties:\n  replicas:\n    default: 1\n",
        );

        let module = Module::load(dir.path()).unwrap();
        let schema = module.effective_schema().unwrap().unwrap();
        assert!(schema.properties.contains_key("replicas"));
    }

    #[test]
    fn test_effective_schema_absent() {
        let dir = TempDir::new().unwrap();
        let module = Module::load(dir.path()).unwrap();
        assert!(module.effective_schema().unwrap().is_none());
    }

    #[test]
    fn test_template_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "templates/service.yaml", "");
        write(dir.path(), "templates/_helpers.tpl", "");
        write(dir.path(), "templates/rbac/role.yaml", "");
        write(dir.path(), "templates/README.md", "");

        let module = Module::load(dir.path()).unwrap();
        let names: Vec<String> = module
            .template_files()
            .unwrap()
            .iter()
            .map(|p| {
                p.strip_prefix(&module.templates_dir)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();

        assert_eq!(names, vec!["_helpers.tpl", "rbac/role.yaml", "service.yaml"]);
    }

    #[test]
    fn test_image_digests() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("node-manager");
        fs::create_dir_all(root.join("images/bashible-apiserver")).unwrap();
        fs::create_dir_all(root.join("images/early-oom")).unwrap();
        write(&root, "images/README.md", "");

        let module = Module::load(&root).unwrap();
        let digests = module.image_digests().unwrap();

        assert_eq!(
            digests.keys().collect::<Vec<_>>(),
            vec!["bashibleApiserver", "earlyOom"]
        );
        assert!(digests["earlyOom"].starts_with("sha256:"));
        assert_eq!(digests["earlyOom"].len(), "sha256:".len() + 64);
        assert_eq!(module.image_digests().unwrap(), digests);
    }
}
