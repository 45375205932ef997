//! Test-value synthesis from a values schema
//!
//! The synthesizer enumerates concrete value documents that together touch
//! every enumerable branch of a schema: each enum literal, each `x-examples`
//! entry, each nested object expansion and each `oneOf`/`anyOf` branch.
//!
//! It is a breadth-first worklist. A run flattens the schema's properties
//! into an indexed table once; every [`SchemaNode`] on the work queue holds
//! the index of its next unresolved property and the partial document built
//! so far. Popping a node resolves exactly one property and pushes one child
//! per possible value to the back of the queue. A node with nothing left to
//! resolve moves to the result queue. The result queue therefore ends up
//! holding the Cartesian product of every property's value domain.
//!
//! Properties whose shape cannot be synthesized are left out of the document
//! instead of failing the run. The only failures are the depth and document
//! limits, which abort every enclosing recursive run.

use serde_json::Value as JsonValue;
use std::collections::VecDeque;

use crate::error::SynthesisError;
use crate::schema::{Items, Schema};

/// A partially built value document
pub type Leaf = serde_json::Map<String, JsonValue>;

type Result<T> = std::result::Result<T, SynthesisError>;

pub const DEFAULT_MAX_DEPTH: usize = 32;
pub const DEFAULT_MAX_DOCUMENTS: usize = 4096;

/// Work item: the properties still to resolve plus the document so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    /// Index of the next unresolved entry in the run's property table
    next: usize,
    leaf: Leaf,
}

impl SchemaNode {
    fn child(&self, next: usize) -> Self {
        Self {
            next,
            leaf: self.leaf.clone(),
        }
    }

    pub fn into_leaf(self) -> Leaf {
        self.leaf
    }
}

/// How one property is resolved in one pass
enum Resolution {
    /// One child per value, the property set to it
    Values(Vec<JsonValue>),
    /// One child without the property
    Drop,
    /// Property passed over, nothing spawned for it
    Skip,
}

/// Builder for [`Synthesizer`]
pub struct SynthesizerBuilder {
    max_depth: usize,
    max_documents: usize,
}

impl Default for SynthesizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SynthesizerBuilder {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_documents: DEFAULT_MAX_DOCUMENTS,
        }
    }

    /// Maximum nesting of recursive expansions (objects, arrays, combinators)
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Maximum number of nodes a single run may hold at once
    pub fn max_documents(mut self, max_documents: usize) -> Self {
        self.max_documents = max_documents;
        self
    }

    pub fn build(self) -> Synthesizer {
        Synthesizer {
            max_depth: self.max_depth,
            max_documents: self.max_documents,
        }
    }
}

/// Value document generator
///
/// Holds only its limits, so one instance can serve any number of
/// concurrent runs.
#[derive(Debug, Clone, Copy)]
pub struct Synthesizer {
    max_depth: usize,
    max_documents: usize,
}

impl Default for Synthesizer {
    fn default() -> Self {
        SynthesizerBuilder::new().build()
    }
}

impl Synthesizer {
    pub fn builder() -> SynthesizerBuilder {
        SynthesizerBuilder::new()
    }

    /// Enumerate value documents for a (transformed) schema
    ///
    /// Returns no documents when the schema has no properties.
    pub fn synthesize(&self, schema: &Schema) -> Result<Vec<JsonValue>> {
        let leaves = self.run(schema, "", 0)?;
        tracing::debug!(documents = leaves.len(), "synthesized value documents");
        Ok(leaves.into_iter().map(JsonValue::Object).collect())
    }

    fn run(&self, schema: &Schema, path: &str, depth: usize) -> Result<Vec<Leaf>> {
        if depth > self.max_depth {
            return Err(SynthesisError::DepthExceeded {
                path: if path.is_empty() {
                    "(root)".to_string()
                } else {
                    path.to_string()
                },
                limit: self.max_depth,
            });
        }
        if schema.properties.is_empty() {
            return Ok(vec![]);
        }

        let table: Vec<(&str, &Schema)> = schema
            .properties
            .iter()
            .map(|(name, prop)| (name.as_str(), prop))
            .collect();

        let mut work = VecDeque::from([SchemaNode::default()]);
        let mut results = VecDeque::new();

        while let Some(node) = work.pop_front() {
            let spawned = self.expand(&table, &node, &mut work, path, depth)?;
            if spawned == 0 {
                results.push_back(node);
            }
            if work.len() + results.len() > self.max_documents {
                return Err(SynthesisError::TooManyDocuments {
                    limit: self.max_documents,
                });
            }
        }

        Ok(results.into_iter().map(SchemaNode::into_leaf).collect())
    }

    /// Resolve the next property of `node`, returning how many children
    /// were pushed
    fn expand(
        &self,
        table: &[(&str, &Schema)],
        node: &SchemaNode,
        work: &mut VecDeque<SchemaNode>,
        path: &str,
        depth: usize,
    ) -> Result<usize> {
        let mut cursor = node.next;

        while let Some(&(name, prop)) = table.get(cursor) {
            let prop_path = join_path(path, name);

            match self.resolve(prop, &prop_path, depth)? {
                Resolution::Skip => {
                    tracing::warn!(path = %prop_path, "allOf is not supported, property skipped");
                    cursor += 1;
                }
                Resolution::Drop => {
                    work.push_back(node.child(cursor + 1));
                    return Ok(1);
                }
                Resolution::Values(values) => {
                    let count = values.len();
                    for value in values {
                        let mut child = node.child(cursor + 1);
                        child.leaf.insert(name.to_string(), value);
                        work.push_back(child);
                    }
                    return Ok(count);
                }
            }
        }

        Ok(0)
    }

    fn resolve(&self, prop: &Schema, path: &str, depth: usize) -> Result<Resolution> {
        let examples = prop.examples();
        if !examples.is_empty() {
            return Ok(Resolution::Values(examples.to_vec()));
        }

        if !prop.enum_values.is_empty() {
            return Ok(Resolution::Values(prop.enum_values.clone()));
        }

        if prop.is_object() {
            let Some(default) = &prop.default else {
                return Ok(Resolution::Drop);
            };
            let nested = self.run(prop, path, depth + 1)?;
            // no nested documents: the default literal stands in for them
            return Ok(if nested.is_empty() {
                Resolution::Values(vec![default.clone()])
            } else {
                Resolution::Values(nested.into_iter().map(JsonValue::Object).collect())
            });
        }

        if let Some(default) = &prop.default {
            return Ok(Resolution::Values(vec![default.clone()]));
        }

        if prop.is_array() {
            if let Some(Items::Single(items)) = &prop.items {
                return Ok(resolve_array_items(items));
            }
        }

        if !prop.all_of.is_empty() {
            return Ok(Resolution::Skip);
        }

        if let Some(branch) = prop.one_of.first() {
            let merged = merge_branch(prop.clone(), branch);
            let nested = self.run(&merged, path, depth + 1)?;
            return Ok(documents_or_drop(nested));
        }

        if !prop.any_of.is_empty() {
            let mut nested = Vec::new();
            for branch in &prop.any_of {
                let merged = merge_branch(prop.clone(), branch);
                nested.extend(self.run(&merged, path, depth + 1)?);
            }
            // the unmerged property is expanded once more on top of the branches
            nested.extend(self.run(prop, path, depth + 1)?);
            return Ok(documents_or_drop(nested));
        }

        Ok(Resolution::Drop)
    }
}

/// Array items with a default give a one-element list, anything else drops
fn resolve_array_items(items: &Schema) -> Resolution {
    match &items.default {
        Some(default) => Resolution::Values(vec![JsonValue::Array(vec![default.clone()])]),
        None => Resolution::Drop,
    }
}

/// Synthesize with the default limits
pub fn synthesize(schema: &Schema) -> Result<Vec<JsonValue>> {
    Synthesizer::default().synthesize(schema)
}

/// Fold a combinator branch into a copy of its owning property
///
/// The base loses its own combinators, gains the branch's properties
/// (branch wins on collision) and takes over the branch's combinators.
pub fn merge_branch(mut base: Schema, branch: &Schema) -> Schema {
    base.properties
        .extend(branch.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
    base.one_of = branch.one_of.clone();
    base.any_of = branch.any_of.clone();
    base.all_of = branch.all_of.clone();
    base
}

fn documents_or_drop(leaves: Vec<Leaf>) -> Resolution {
    if leaves.is_empty() {
        Resolution::Drop
    } else {
        Resolution::Values(leaves.into_iter().map(JsonValue::Object).collect())
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}
