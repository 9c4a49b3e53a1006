//! # aerosearch-core
//!
//! Small-corpus text retrieval: a positional inverted index, a boolean and
//! proximity query language evaluated over it, and BM25 ranking with optional
//! candidate restriction.
//!
//! The index is built once from an in-memory set of `(id, text)` pairs and is
//! read-only afterwards, so a built [`InvertedIndex`] can be shared across
//! threads behind an `Arc` without locking.
//!
//! ```text
//! (id, text) → Tokenizer → InvertedIndex ─┬→ QueryEvaluator → doc ids ─┐
//!                                         └→ Bm25 ←───── candidates ────┘
//! ```

/// BM25 Okapi ranking with candidate restriction, top-k selection and score explanation.
pub mod bm25;
/// Compile-time defaults: BM25 parameters, proximity windows and display limits.
pub mod config;
/// The five-document aviation corpus used by examples, tests and benches.
pub mod demo;
/// Core document types.
pub mod document;
/// Error types for strict query parsing and parameter validation.
pub mod error;
/// Ranking quality metrics: nDCG, average precision and recall.
pub mod evaluation;
/// Positional inverted index with per-document sentence boundaries.
pub mod index;
/// Boolean, phrase and proximity query language.
pub mod query;
/// Sentence segmentation, word tokenization and stop words.
pub mod text;

pub use bm25::{Bm25, Bm25Params};
pub use document::{DocId, Document};
pub use error::{ConfigError, QueryError};
pub use index::{IndexBuilder, InvertedIndex, Posting, SentenceSpan};
pub use query::{evaluate, QueryEvaluator, QueryOptions, QueryOutcome, QueryWarning};
pub use text::{StopWords, Tokenizer};
