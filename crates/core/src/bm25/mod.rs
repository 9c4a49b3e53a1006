//! BM25 ranking over the positional index.
//!
//! Implements Okapi BM25 with configurable `k1` and `b`. Term frequencies come
//! from posting positions; queries are tokenized with the index tokenizer, so
//! stop words never contribute. Scoring can be restricted to a candidate set,
//! typically the result of a boolean query.

/// Parameters, scorer, top-k selection and per-term explanation.
pub mod scorer;

pub use scorer::{idf, Bm25, Bm25Params, TermContribution};
