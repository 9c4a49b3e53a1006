//! Positional inverted index.
//!
//! Maps each term to a postings list of `(document, positions)` sorted by
//! document id, and keeps per-document lengths and sentence spans in the same
//! position space. Built once through an [`IndexBuilder`], read-only afterwards.

/// Index builder and read-only index.
pub mod inverted_index;

pub use inverted_index::{IndexBuilder, InvertedIndex, Posting, SentenceSpan};
