//! Sentence splitter and word tokenizer with stop word removal.
//!
//! [`Tokenizer::segment`] produces the flat, position-bearing token list of a
//! document together with its sentence grouping. Positions are indices into
//! the flat list *after* stop word removal, so `word1 the word2` and
//! `word1 word2` are indistinguishable to phrase matching.

use super::StopWords;
use regex::Regex;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9]+(?:['-][a-z0-9]+)?").expect("valid word pattern")
});

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence pattern"));

/// Split text into sentences at whitespace following `.`, `!` or `?`.
///
/// The terminating punctuation stays with its sentence. Text without a
/// boundary is one sentence; empty or whitespace-only text has none.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_BREAK.find_iter(text) {
        // the punctuation mark is a single ASCII byte
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Lowercased words of `text`, stop words included.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD.find_iter(text).map(|m| m.as_str().to_ascii_lowercase())
}

/// Tokens of one document: a flat list plus sentence grouping as offsets into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmented {
    tokens: Vec<String>,
    // exclusive end offset of each sentence in `tokens`
    sentence_ends: Vec<usize>,
}

impl Segmented {
    /// All surviving tokens in document order; the index of a token is its position.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Tokens grouped by sentence. Sentences made only of stop words are empty slices.
    pub fn sentences(&self) -> impl Iterator<Item = &[String]> + '_ {
        let mut start = 0;
        self.sentence_ends.iter().map(move |&end| {
            let sentence = &self.tokens[start..end];
            start = end;
            sentence
        })
    }

    pub fn sentence_count(&self) -> usize {
        self.sentence_ends.len()
    }

    /// Number of surviving tokens (the document length used by BM25).
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }
}

/// Stateless text analyzer configured with a stop word set.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    stop_words: StopWords,
}

impl Tokenizer {
    pub fn new(stop_words: StopWords) -> Self {
        Self { stop_words }
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    /// Lowercased words of `text` with stop words removed, ignoring sentences.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        words(text)
            .filter(|w| !self.stop_words.contains(w))
            .collect()
    }

    /// Segment text into sentences, then into stop-word-free tokens.
    pub fn segment(&self, text: &str) -> Segmented {
        let mut out = Segmented::default();
        for sentence in split_sentences(text) {
            out.tokens.extend(
                words(sentence).filter(|w| !self.stop_words.contains(w)),
            );
            out.sentence_ends.push(out.tokens.len());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let s = split_sentences("Engine failed. Pilot landed! Was it fuel? Unknown");
        assert_eq!(s, vec!["Engine failed.", "Pilot landed!", "Was it fuel?", "Unknown"]);
    }

    #[test]
    fn test_split_requires_whitespace_after_mark() {
        assert_eq!(split_sentences("v1.2 rotated at 3.5nm"), vec!["v1.2 rotated at 3.5nm"]);
        assert!(split_sentences("   \n\t ").is_empty());
        assert!(split_sentences("").is_empty());
    }

    #[test]
    fn test_words_joiners_and_case() {
        let w: Vec<String> = words("Go-Around, pilot's ATC--tower a-b-c").collect();
        assert_eq!(w, vec!["go-around", "pilot's", "atc", "tower", "a-b", "c"]);
    }

    #[test]
    fn test_tokenize_removes_stop_words() {
        let t = Tokenizer::default();
        assert_eq!(
            t.tokenize("The quick brown fox jumps over the lazy dog"),
            vec!["quick", "brown", "fox", "jumps", "lazy", "dog"]
        );
    }

    #[test]
    fn test_segment_positions_are_dense() {
        let t = Tokenizer::default();
        let seg = t.segment("The engine failed. It was the fuel pump.");
        assert_eq!(seg.tokens(), &["engine", "failed", "fuel", "pump"]);
        let sentences: Vec<&[String]> = seg.sentences().collect();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0], &["engine", "failed"]);
        assert_eq!(sentences[1], &["fuel", "pump"]);
    }

    #[test]
    fn test_segment_keeps_stop_word_only_sentence() {
        let t = Tokenizer::default();
        let seg = t.segment("Runway closed. It was. Tower advised.");
        assert_eq!(seg.sentence_count(), 3);
        assert!(seg.sentences().nth(1).unwrap().is_empty());
        assert_eq!(seg.len(), 4);
    }

    #[test]
    fn test_segment_empty() {
        let seg = Tokenizer::default().segment("  ");
        assert!(seg.is_empty());
        assert_eq!(seg.sentence_count(), 0);
    }

    #[test]
    fn test_custom_stop_words() {
        let t = Tokenizer::new(StopWords::empty());
        assert_eq!(t.tokenize("the runway"), vec!["the", "runway"]);
    }

    #[test]
    fn test_deterministic() {
        let t = Tokenizer::default();
        let text = "Crosswind gusts. Unstable short final! Veer-off avoided?";
        assert_eq!(t.segment(text), t.segment(text));
    }
}
