//! Result rendering: snippets, titles and plain-text or JSON hit lists.

use crate::corpus::{Corpus, Record};
use aerosearch_core::bm25::idf;
use aerosearch_core::text::split_sentences;
use aerosearch_core::{DocId, InvertedIndex};
use serde::Serialize;
use std::io::{self, Write};

/// Metadata fields joined into a one-line title.
const TITLE_FIELDS: [&str; 6] = ["EventDate", "City", "State", "Make", "Model", "EventType"];

/// One displayed result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub rank: usize,
    pub doc_id: DocId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_id: Option<String>,
}

/// Builds [`SearchHit`]s for one query.
pub struct Renderer<'a> {
    corpus: &'a Corpus,
    index: &'a InvertedIndex,
    query_terms: Vec<String>,
    max_chars: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(corpus: &'a Corpus, index: &'a InvertedIndex, query: &str, max_chars: usize) -> Self {
        let mut query_terms = index.tokenizer().tokenize(query);
        query_terms.sort_unstable();
        query_terms.dedup();
        Self {
            corpus,
            index,
            query_terms,
            max_chars,
        }
    }

    /// The first `top_k` of `ids`, with optional scores.
    pub fn hits<I>(&self, ids: I, top_k: usize) -> Vec<SearchHit>
    where
        I: IntoIterator<Item = (DocId, Option<f32>)>,
    {
        ids.into_iter()
            .filter_map(|(doc_id, score)| Some((doc_id, score, self.corpus.get(doc_id)?)))
            .take(top_k)
            .enumerate()
            .map(|(i, (doc_id, score, record))| SearchHit {
                rank: i + 1,
                doc_id,
                score,
                title: title(record),
                snippet: self.snippet(&record.text),
                orig_id: record.meta_str("orig_id"),
            })
            .collect()
    }

    /// The sentence with the highest summed idf of distinct query terms,
    /// truncated to the character limit. Ties go to the earlier sentence.
    pub fn snippet(&self, text: &str) -> String {
        let tokenizer = self.index.tokenizer();
        let mut best: Option<(&str, f32)> = None;
        for sentence in split_sentences(text) {
            let mut words = tokenizer.tokenize(sentence);
            words.sort_unstable();
            words.dedup();
            let weight: f32 = words
                .iter()
                .filter(|w| self.query_terms.binary_search(w).is_ok())
                .map(|w| idf(self.index.document_count(), self.index.document_frequency(w)))
                .sum();
            if best.map_or(true, |(_, w)| weight > w) {
                best = Some((sentence, weight));
            }
        }
        let sentence = best.map_or(text.trim(), |(s, _)| s);
        truncate(sentence, self.max_chars)
    }
}

/// Metadata title such as `2021-05-01 | Denver | CO | CESSNA | 172`.
pub fn title(record: &Record) -> Option<String> {
    let parts: Vec<String> = TITLE_FIELDS
        .iter()
        .filter_map(|k| record.meta_str(k))
        .collect();
    (!parts.is_empty()).then(|| parts.join(" | "))
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `…`.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => format!("{}…", text[..byte].trim_end()),
        None => text.to_string(),
    }
}

/// Plain-text listing, one block per hit.
pub fn write_hits(out: &mut impl Write, hits: &[SearchHit]) -> io::Result<()> {
    for hit in hits {
        write!(out, "{:>2}. doc {}", hit.rank, hit.doc_id)?;
        if let Some(score) = hit.score {
            write!(out, "  score={score:.3}")?;
        }
        writeln!(out)?;
        if let Some(title) = &hit.title {
            writeln!(out, "    {title}")?;
        }
        writeln!(out, "    {}", hit.snippet)?;
        if let Some(orig) = &hit.orig_id {
            writeln!(out, "    ID: {orig}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
