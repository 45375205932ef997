//! Schema transforms applied before value synthesis
//!
//! Each transformer rewrites a whole tree and walks whatever part of it it
//! needs on its own. Ordering is the caller's business: a
//! [`TransformPipeline`] just feeds each transformer the previous output.

use std::collections::BTreeMap;

use crate::schema::{AdditionalProperties, Items, Schema};

/// A pure schema-to-schema rewrite
pub trait SchemaTransformer {
    fn transform(&self, schema: Schema) -> Schema;
}

/// Closes every object: unset `additionalProperties` becomes `false`
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditionalPropertiesTransformer;

impl SchemaTransformer for AdditionalPropertiesTransformer {
    fn transform(&self, mut schema: Schema) -> Schema {
        lock_down(&mut schema);
        schema
    }
}

fn lock_down(schema: &mut Schema) {
    if schema.additional_properties.is_none() {
        schema.additional_properties = Some(AdditionalProperties::Bool(false));
    }

    for prop in schema.properties.values_mut() {
        lock_down(prop);
    }

    match &mut schema.items {
        Some(Items::Single(item)) => lock_down(item),
        Some(Items::Tuple(items)) => items.iter_mut().for_each(lock_down),
        None => {}
    }
}

/// Merges a schema carrying `x-extend` with its parent schema
///
/// The reference in `x-extend.schema` is not resolved: whatever parent the
/// transformer was built with is the one merged in.
#[derive(Debug, Clone, Default)]
pub struct ExtendTransformer {
    parent: Option<Schema>,
}

impl ExtendTransformer {
    pub fn new(parent: Option<Schema>) -> Self {
        Self { parent }
    }

    pub fn with_parent(parent: Schema) -> Self {
        Self::new(Some(parent))
    }
}

impl SchemaTransformer for ExtendTransformer {
    fn transform(&self, schema: Schema) -> Schema {
        let Some(parent) = &self.parent else {
            return schema;
        };
        if schema.extend_target().is_none() {
            return schema;
        }

        tracing::debug!(
            reference = schema.extend_target().unwrap_or_default(),
            "merging x-extend parent schema"
        );
        merge_with_parent(schema, parent)
    }
}

fn merge_with_parent(mut child: Schema, parent: &Schema) -> Schema {
    // parent order first, then the child's additions
    let mut required = parent.required.clone();
    for name in child.required.drain(..) {
        if !required.contains(&name) {
            required.push(name);
        }
    }
    child.required = required;

    child.properties = overlay(&parent.properties, child.properties);
    child.pattern_properties = overlay(&parent.pattern_properties, child.pattern_properties);
    child.definitions = overlay(&parent.definitions, child.definitions);
    child.extensions = overlay(&parent.extensions, child.extensions);

    if child.title.is_empty() {
        child.title = parent.title.clone();
    }
    if child.description.is_empty() {
        child.description = parent.description.clone();
    }

    child
}

/// Shallow overlay where the child's entries win
fn overlay<V: Clone>(
    base: &BTreeMap<String, V>,
    top: BTreeMap<String, V>,
) -> BTreeMap<String, V> {
    let mut merged = base.clone();
    merged.extend(top);
    merged
}

/// Promotes `x-required-for-helm` names into `required`, recursively
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredForHelmTransformer;

impl SchemaTransformer for RequiredForHelmTransformer {
    fn transform(&self, mut schema: Schema) -> Schema {
        promote_required(&mut schema);
        schema
    }
}

fn promote_required(schema: &mut Schema) {
    let extra: Vec<String> = schema
        .required_for_helm()
        .into_iter()
        .map(str::to_string)
        .collect();

    for name in extra {
        if !schema.required.contains(&name) {
            schema.required.push(name);
        }
    }

    for prop in schema.properties.values_mut() {
        promote_required(prop);
    }
}

/// Left-to-right composition of transformers
#[derive(Default)]
pub struct TransformPipeline {
    transformers: Vec<Box<dyn SchemaTransformer + Send + Sync>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transformer to the end of the pipeline
    pub fn then(mut self, transformer: impl SchemaTransformer + Send + Sync + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    /// The pipeline used for module values schemas
    ///
    /// `parent` is the module's config-values schema; it is locked down
    /// before being merged so inherited properties are closed as well.
    pub fn for_module(parent: Option<Schema>) -> Self {
        let parent = parent.map(|p| AdditionalPropertiesTransformer.transform(p));
        Self::new()
            .then(AdditionalPropertiesTransformer)
            .then(ExtendTransformer::new(parent))
            .then(RequiredForHelmTransformer)
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Run every transformer in order; a missing schema stays missing
    pub fn apply(&self, schema: Option<Schema>) -> Option<Schema> {
        schema.map(|s| {
            self.transformers
                .iter()
                .fold(s, |acc, transformer| transformer.transform(acc))
        })
    }
}
