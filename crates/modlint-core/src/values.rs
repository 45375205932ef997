//! Values handling with deep merge support

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Values container with deep merge capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load values from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Ok(Self(value))
    }

    /// Deep merge another Values into this one
    ///
    /// Rules:
    /// - Scalars: overlay replaces base
    /// - Objects: recursive merge
    /// - Arrays: overlay replaces base (not appended)
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Set a value by dotted path (e.g., "modulesImages.registry")
    pub fn set(&mut self, path: &str, value: JsonValue) -> Result<()> {
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return Err(CoreError::ValuesMerge {
                message: format!("Invalid values path: '{}'", path),
            });
        }
        let parts: Vec<&str> = path.split('.').collect();
        set_nested(&mut self.0, &parts, value);
        Ok(())
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert to JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }
}

impl From<JsonValue> for Values {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}

/// Deep merge two JSON values
fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Set a nested value by path, replacing non-object intermediates
fn set_nested(value: &mut JsonValue, path: &[&str], new_value: JsonValue) {
    let Some((key, remaining)) = path.split_first() else {
        *value = new_value;
        return;
    };

    if !value.is_object() {
        *value = JsonValue::Object(serde_json::Map::new());
    }

    if let JsonValue::Object(map) = value {
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
        set_nested(entry, remaining, new_value);
    }
}

/// Get a nested value by path
fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let Some((key, remaining)) = path.split_first() else {
        return Some(value);
    };

    match value {
        JsonValue::Object(map) => map.get(*key).and_then(|v| get_nested(v, remaining)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_merge() {
        let mut base = Values::from_yaml(
            r#"
modulesImages:
  registry:
    base: registry.example.com
  tags:
    common: "1.0"
clusterConfiguration:
  clusterType: Cloud
"#,
        )
        .unwrap();

        let overlay = Values::from_yaml(
            r#"
modulesImages:
  tags:
    common: "2.0"
clusterConfiguration:
  clusterType: Static
"#,
        )
        .unwrap();

        base.merge(&overlay);

        assert_eq!(
            base.get("modulesImages.registry.base").unwrap(),
            "registry.example.com"
        );
        assert_eq!(base.get("modulesImages.tags.common").unwrap(), "2.0");
        assert_eq!(base.get("clusterConfiguration.clusterType").unwrap(), "Static");
    }

    #[test]
    fn test_merge_replaces_arrays() {
        let mut base = Values::from_yaml("hosts: [a, b]").unwrap();
        base.merge(&Values::from_yaml("hosts: [c]").unwrap());
        assert_eq!(base.get("hosts").unwrap(), &serde_json::json!(["c"]));
    }

    #[test]
    fn test_set_nested() {
        let mut values = Values::new();
        values
            .set("modulesImages.digests", serde_json::json!({}))
            .unwrap();
        values
            .set("discovery.kubernetesVersion", JsonValue::String("1.28".into()))
            .unwrap();

        assert!(values.get("modulesImages.digests").unwrap().is_object());
        assert_eq!(values.get("discovery.kubernetesVersion").unwrap(), "1.28");
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut values = Values::from_yaml("discovery: none").unwrap();
        values.set("discovery.version", serde_json::json!(1)).unwrap();
        assert_eq!(values.get("discovery.version").unwrap(), 1);
    }

    #[test]
    fn test_set_rejects_empty_segments() {
        let mut values = Values::new();
        assert!(values.set("a..b", serde_json::json!(1)).is_err());
        assert!(values.set("", serde_json::json!(1)).is_err());
    }

    #[test]
    fn test_is_empty() {
        assert!(Values::new().is_empty());
        assert!(Values(JsonValue::Null).is_empty());
        assert!(!Values::from_yaml("a: 1").unwrap().is_empty());
    }
}
