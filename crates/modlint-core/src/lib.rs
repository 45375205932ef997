//! modlint core - schema model, transforms and test-value synthesis
//!
//! This crate provides the building blocks used by the linter:
//! - `Schema`: OpenAPI values schema tree with vendor extensions
//! - `transform`: lockdown, `x-extend` merge and `x-required-for-helm` promotion
//! - `Synthesizer`: enumerates value documents covering every schema branch
//! - `Module`: module directory loading (Chart.yaml, openapi/, templates/, images/)
//! - `RenderContext`: Helm-style template context for one values document
//! - `LintConfig`: lint settings

pub mod config;
pub mod context;
pub mod error;
pub mod module;
pub mod schema;
pub mod synth;
pub mod transform;
pub mod values;

pub use config::LintConfig;
pub use context::{Capabilities, ChartInfo, KubeVersion, ReleaseInfo, RenderContext};
pub use error::{CoreError, SynthesisError};
pub use module::{ChartMetadata, Module};
pub use schema::{AdditionalProperties, Items, Schema, SchemaType};
pub use synth::{Leaf, SchemaNode, Synthesizer, SynthesizerBuilder, synthesize};
pub use transform::{
    AdditionalPropertiesTransformer, ExtendTransformer, RequiredForHelmTransformer,
    SchemaTransformer, TransformPipeline,
};
pub use values::Values;
