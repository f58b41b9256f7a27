//! Error types for the math layout crate

use crate::font::{FontParam, FontVariant};
use crate::model::{NodeId, NodeKind};
use thiserror::Error;

/// Errors that can occur during a layout pass
#[derive(Error, Debug)]
pub enum MathError {
    /// An attribute value outside its declared domain.
    ///
    /// Resolution absorbs this error and substitutes the per-kind default;
    /// it never escapes a layout pass.
    #[error("invalid value {value:?} for attribute `{attribute}` on {kind}")]
    AttributeDomain {
        kind: NodeKind,
        attribute: String,
        value: String,
    },

    /// A required font constant is absent from the parameter set
    #[error("missing font parameter: {0}")]
    MissingFontParameter(FontParam),

    /// No metrics for a character in the requested variant or its fallbacks
    #[error("missing glyph metric for {ch:?} in variant {variant}")]
    MissingGlyphMetric { variant: FontVariant, ch: char },

    /// A node kind reached the script engine that is not a script construct
    #[error("unsupported script construct: {0}")]
    UnsupportedConstruct(NodeKind),

    /// A construct with the wrong number of children
    #[error("invalid {kind} structure: expected {expected} children, found {found}")]
    InvalidStructure {
        kind: NodeKind,
        expected: usize,
        found: usize,
    },

    /// A layout option outside its valid range
    #[error("invalid layout option `{name}`: {value}")]
    InvalidOption { name: &'static str, value: f64 },

    /// Side-table lookup for a node that is not part of the tree
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// JSON error while loading a tree or configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for math layout operations
pub type MathResult<T> = Result<T, MathError>;
