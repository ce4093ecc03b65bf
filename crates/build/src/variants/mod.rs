//! Draw shader variant enumeration
//!
//! The Metal backend precompiles the draw shaders once per feature combination, each in its own
//! namespace. This module decides which combinations are built and generates the source that
//! includes the minified shaders under the matching `#define`s.

pub mod emit;
pub mod features;
pub mod manifest;
pub mod plan;

pub use emit::{GENERATED_HEADER, emit_variant, emit_variants};
pub use features::{DrawType, Feature, FeatureSet, FillRule, ShaderStage, Variant};
pub use manifest::{DrawCombinationsSpec, FeatureUniverse, IncludeSpec};
pub use plan::{all_valid_variants, canonical_variants, sweep};
