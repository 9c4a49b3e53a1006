//! Text analysis: sentence segmentation, word tokenization and stop word removal.
//!
//! Words are maximal runs of ASCII alphanumerics, optionally joined by one
//! apostrophe or hyphen (`go-around`, `pilot's`), lowercased. Stop words are
//! removed before positions are assigned, so positions are dense.

/// Configurable stop word set.
pub mod stopwords;
/// Sentence splitter and word tokenizer.
pub mod tokenizer;

pub use stopwords::StopWords;
pub use tokenizer::{split_sentences, words, Segmented, Tokenizer};
