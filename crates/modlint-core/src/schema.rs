//! OpenAPI schema model for module values
//!
//! This module provides the in-memory tree of an OpenAPI / JSON Schema
//! document as used by module `openapi/*.yaml` files. Only the keywords the
//! transforms and the value synthesizer understand are modelled as fields;
//! everything else (vendor `x-` keys included) lands in `extensions`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Example values to enumerate instead of the declared type
pub const X_EXAMPLES: &str = "x-examples";
/// Inheritance from another schema file (`{schema: config-values.yaml}`)
pub const X_EXTEND: &str = "x-extend";
/// Fields required for template rendering but optional in the public API
pub const X_REQUIRED_FOR_HELM: &str = "x-required-for-helm";

/// Set of type tags (`type: string` or `type: [string, "null"]`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaType(pub Vec<String>);

impl SchemaType {
    pub fn contains(&self, kind: &str) -> bool {
        self.0.iter().any(|k| k == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for SchemaType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(kind) => Self(vec![kind]),
            OneOrMany::Many(kinds) => Self(kinds),
        })
    }
}

impl Serialize for SchemaType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0.as_slice() {
            [single] => serializer.serialize_str(single),
            kinds => kinds.serialize(serializer),
        }
    }
}

/// Array item schema: one schema for every item, or a tuple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Tuple(Vec<Schema>),
    Single(Box<Schema>),
}

/// `additionalProperties`: a flag or a schema for the extra values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

/// A schema node
///
/// Properties are kept in a sorted map, which makes every walk over them
/// (transforms, synthesis, serialization) happen in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "SchemaType::is_empty")]
    pub schema_type: SchemaType,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pattern_properties: BTreeMap<String, Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<JsonValue>,

    /// `default: null` deserializes to `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, Schema>,

    /// Vendor extensions and keywords without a dedicated field
    #[serde(flatten)]
    pub extensions: BTreeMap<String, JsonValue>,
}

impl Schema {
    /// Load a schema from a YAML or JSON file, chosen by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| CoreError::InvalidSchema {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parse a schema from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a schema from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn has_type(&self, kind: &str) -> bool {
        self.schema_type.contains(kind)
    }

    pub fn is_object(&self) -> bool {
        self.has_type("object")
    }

    pub fn is_array(&self) -> bool {
        self.has_type("array")
    }

    pub fn extension(&self, key: &str) -> Option<&JsonValue> {
        self.extensions.get(key)
    }

    /// `x-examples` values, empty when absent or not a list
    pub fn examples(&self) -> &[JsonValue] {
        self.extension(X_EXAMPLES)
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Schema reference named by `x-extend`, if any
    pub fn extend_target(&self) -> Option<&str> {
        self.extension(X_EXTEND)?.get("schema")?.as_str()
    }

    /// Names listed in `x-required-for-helm` (a string or a list of strings)
    pub fn required_for_helm(&self) -> Vec<&str> {
        match self.extension(X_REQUIRED_FOR_HELM) {
            Some(JsonValue::String(name)) => vec![name.as_str()],
            Some(JsonValue::Array(names)) => names.iter().filter_map(|n| n.as_str()).collect(),
            _ => vec![],
        }
    }
}
