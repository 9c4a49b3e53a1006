//! Stop word set passed explicitly to the [`Tokenizer`](super::Tokenizer).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Default English stop list, tuned for short incident narratives.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "of", "to", "in", "for", "on", "at", "by", "with", "as",
    "is", "was", "were", "be", "been", "being", "from", "that", "this", "it", "its", "into",
    "over", "after", "before", "than", "then", "so", "such",
];

static DEFAULT: LazyLock<StopWords> = LazyLock::new(|| StopWords::from_words(DEFAULT_STOP_WORDS));

/// A case-insensitive set of words removed before indexing and querying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// An empty set: every word is kept.
    pub fn empty() -> Self {
        Self {
            words: HashSet::new(),
        }
    }

    /// Builds a set from arbitrary words; entries are lowercased and trimmed.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Adds a word to the set.
    pub fn with(mut self, word: &str) -> Self {
        let word = word.trim().to_lowercase();
        if !word.is_empty() {
            self.words.insert(word);
        }
        self
    }

    /// Removes a word from the set.
    pub fn without(mut self, word: &str) -> Self {
        self.words.remove(&word.trim().to_lowercase());
        self
    }

    /// Returns `true` if `word` is a stop word, ignoring case.
    pub fn contains(&self, word: &str) -> bool {
        if word.chars().any(char::is_uppercase) {
            self.words.contains(&word.to_lowercase())
        } else {
            self.words.contains(word)
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Iterates the words in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.words.iter().map(String::as_str)
    }
}

impl Default for StopWords {
    fn default() -> Self {
        DEFAULT.clone()
    }
}
