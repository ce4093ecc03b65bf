//! Error types for the shader build pipeline.
//!
//! Every error is terminal for the current invocation: a partially minified or partially
//! enumerated shader set is never written out on purpose.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while tokenizing shader source
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    /// A character no lexical rule accepts (strict mode only)
    #[error("Illegal character '{character}' at line {line}")]
    IllegalCharacter { character: char, line: usize },
    /// A `#define`, `#ifdef` or `#ifndef` whose keyword matched but whose shape did not
    #[error("Malformed #{directive} at line {line}: {text:?}")]
    MalformedDirective { directive: &'static str, text: String, line: usize },
}

/// Internal consistency failures
///
/// These signal a logic bug in the allocator or in the feature universe configuration,
/// never a problem with user input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("generated name '{name}' for '{identifier}' is already allocated")]
    NameCollision { identifier: String, name: String },
    #[error("no name of at most {max_len} characters is left for '{identifier}'")]
    NameSpaceExhausted { identifier: String, max_len: usize },
    #[error("identifier '{0}' has no allocated name")]
    UnnamedIdentifier(String),
    #[error("variant {namespace} fails the {predicate} check")]
    VariantPredicate { predicate: &'static str, namespace: String },
}

/// Problems with the files, directories or manifests an invocation was given
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read '{}': {source}", path.display())]
    ReadInput { path: PathBuf, source: std::io::Error },
    #[error("failed to create output directory '{}': {source}", path.display())]
    CreateOutputDir { path: PathBuf, source: std::io::Error },
    #[error("failed to write '{}': {source}", path.display())]
    WriteOutput { path: PathBuf, source: std::io::Error },
    #[error("invalid draw combinations manifest: {0}")]
    Manifest(#[from] serde_norway::Error),
    #[error("failed to serialize rename map: {0}")]
    RenameMap(#[from] serde_json::Error),
    #[error("unknown feature '{0}'")]
    UnknownFeature(String),
    #[error("'{0}' is not a valid macro name")]
    InvalidFeatureName(String),
    #[error("feature '{name}' has index {index}, but at most {max} features are supported")]
    FeatureIndexOutOfRange { name: String, index: u32, max: u32 },
    #[error("feature '{0}' is declared more than once")]
    DuplicateFeatureName(String),
    #[error("features '{first}' and '{second}' share index {index}")]
    DuplicateFeatureIndex { first: String, second: String, index: u32 },
}

/// Top-level error for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("{file}: {source}")]
    Lex { file: String, source: LexError },
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

pub type Result<T> = std::result::Result<T, Error>;
