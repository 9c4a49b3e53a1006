//! Global configuration constants for aerosearch.
//!
//! These are compile-time defaults; runtime overrides are passed explicitly
//! through [`crate::Bm25Params`], [`crate::QueryOptions`] and the CLI flags.

/// BM25 Okapi term frequency saturation parameter.
///
/// Controls how quickly term frequency saturates. Higher values allow TF to grow more.
/// Standard value is 1.2 (range: 1.0–2.0).
pub const BM25_K1: f32 = 1.2;

/// BM25 Okapi document length normalization parameter.
///
/// 0.0 = no normalization, 1.0 = full normalization. Standard value is 0.75.
pub const BM25_B: f32 = 0.75;

/// Token distance used for the `/p` operator.
///
/// Paragraphs are not tracked by the index; `/p` is `/50`.
pub const PARAGRAPH_WINDOW: u32 = 50;

/// Added to the average document length before dividing, so an empty corpus
/// (or one made only of stop words) never produces NaN scores.
pub const AVG_DOC_LEN_EPSILON: f32 = 1e-9;

/// Default number of results shown by the CLI.
pub const DEFAULT_TOP_K: usize = 10;

/// Maximum snippet length in characters before truncation.
pub const SNIPPET_MAX_CHARS: usize = 240;

/// Top-ranked documents mined for pseudo-relevance feedback terms.
pub const FEEDBACK_DOCS: usize = 10;

/// Feedback terms appended to a query.
pub const FEEDBACK_TERMS: usize = 5;

/// Shorter words are never used as feedback terms.
pub const FEEDBACK_MIN_TERM_LEN: usize = 3;

/// Rank cutoff used by [`crate::evaluation::evaluate_run`].
pub const EVAL_CUTOFF: usize = 10;
