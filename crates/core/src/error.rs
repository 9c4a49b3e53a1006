//! Error types for aerosearch-core.
//!
//! Lenient query evaluation never fails; these errors surface only from
//! strict parsing and from parameter validation.

use crate::query::QueryWarning;
use thiserror::Error;

/// Rejection of a query in strict mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The query contains no evaluable atoms.
    #[error("query is empty")]
    Empty,
    /// The query is structurally malformed.
    #[error("malformed query: {0}")]
    Malformed(QueryWarning),
}

/// Invalid ranking parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("k1 must be finite and non-negative, got {0}")]
    InvalidK1(f32),
    #[error("b must be within [0, 1], got {0}")]
    InvalidB(f32),
}
