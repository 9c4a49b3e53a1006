//! BM25 Okapi scoring engine.
//!
//! Scores documents against a query using the BM25 formula with configurable
//! `k1` and `b` parameters (see [`crate::config`]). Only documents sharing at
//! least one query term are scored, optionally narrowed to a candidate set.

use crate::config;
use crate::document::DocId;
use crate::error::ConfigError;
use crate::index::InvertedIndex;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term frequency saturation.
    pub k1: f32,
    /// Length normalization strength, 0.0 (none) to 1.0 (full).
    pub b: f32,
}

impl Bm25Params {
    /// Validated constructor: `k1` finite and non-negative, `b` within `[0, 1]`.
    pub fn new(k1: f32, b: f32) -> Result<Self, ConfigError> {
        if !k1.is_finite() || k1 < 0.0 {
            return Err(ConfigError::InvalidK1(k1));
        }
        if !(0.0..=1.0).contains(&b) {
            return Err(ConfigError::InvalidB(b));
        }
        Ok(Self { k1, b })
    }
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: config::BM25_K1,
            b: config::BM25_B,
        }
    }
}

/// IDF: `log((N - df + 0.5) / (df + 0.5) + 1)`.
///
/// Non-negative whenever `df <= N`, and strictly decreasing in `df`.
pub fn idf(doc_count: usize, df: usize) -> f32 {
    let n = doc_count as f32;
    let df = df as f32;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Score contribution of one query term to one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermContribution {
    pub term: String,
    /// Occurrences of the term in the document.
    pub tf: u32,
    pub idf: f32,
    pub score: f32,
}

/// BM25 scorer bound to one index.
#[derive(Debug, Clone, Copy)]
pub struct Bm25<'a> {
    index: &'a InvertedIndex,
    params: Bm25Params,
}

impl<'a> Bm25<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        Self::with_params(index, Bm25Params::default())
    }

    pub fn with_params(index: &'a InvertedIndex, params: Bm25Params) -> Self {
        Self { index, params }
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    /// IDF of `term` under the current corpus statistics.
    pub fn idf(&self, term: &str) -> f32 {
        idf(self.index.document_count(), self.index.document_frequency(term))
    }

    /// Distinct query terms in first-occurrence order.
    pub fn query_terms(&self, query: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.index
            .tokenizer()
            .tokenize(query)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }

    /// Score `query` against every matching document, or only those in `candidates`.
    /// Returns `(doc_id, score)` by descending score, ties by ascending id.
    pub fn score(&self, query: &str, candidates: Option<&HashSet<DocId>>) -> Vec<(DocId, f32)> {
        match candidates {
            Some(set) => self.score_filtered(query, |doc| set.contains(&doc)),
            None => self.score_filtered(query, |_| true),
        }
    }

    /// Like [`Bm25::score`] with an arbitrary candidate predicate.
    pub fn score_filtered(&self, query: &str, filter: impl Fn(DocId) -> bool) -> Vec<(DocId, f32)> {
        let mut results: Vec<(DocId, f32)> = self.accumulate(query, filter).into_iter().collect();
        results.sort_unstable_by(ranking);
        results
    }

    /// The `k` best documents, in the same order as [`Bm25::score`].
    pub fn top_k(
        &self,
        query: &str,
        candidates: Option<&HashSet<DocId>>,
        k: usize,
    ) -> Vec<(DocId, f32)> {
        if k == 0 {
            return Vec::new();
        }
        let scores = match candidates {
            Some(set) => self.accumulate(query, |doc| set.contains(&doc)),
            None => self.accumulate(query, |_| true),
        };

        // Partial sort: O(n log k) via min-heap of size k; among equal scores the
        // larger id is evicted first.
        let mut heap: BinaryHeap<Reverse<(OrderedFloat<f32>, Reverse<DocId>)>> =
            BinaryHeap::with_capacity(k + 1);
        for (id, score) in scores {
            heap.push(Reverse((OrderedFloat(score), Reverse(id))));
            if heap.len() > k {
                heap.pop();
            }
        }
        let mut results: Vec<(DocId, f32)> = heap
            .into_iter()
            .map(|Reverse((s, Reverse(id)))| (id, s.0))
            .collect();
        results.sort_unstable_by(ranking);
        results
    }

    /// Per-term breakdown of the score of one document. Terms absent from the
    /// document are omitted; contributions sum to the document's score.
    pub fn explain(&self, query: &str, doc_id: DocId) -> Vec<TermContribution> {
        let Some(doc_len) = self.index.document_length(doc_id) else {
            return Vec::new();
        };
        self.query_terms(query)
            .into_iter()
            .filter_map(|term| {
                let tf = self.index.positions(&term, doc_id)?.len() as u32;
                let idf = self.idf(&term);
                let score = self.term_score(tf, doc_len, idf);
                Some(TermContribution {
                    term,
                    tf,
                    idf,
                    score,
                })
            })
            .collect()
    }

    fn accumulate(&self, query: &str, filter: impl Fn(DocId) -> bool) -> HashMap<DocId, f32> {
        let terms = self.query_terms(query);
        let mut scores: HashMap<DocId, f32> = HashMap::new();
        if terms.is_empty() {
            return scores;
        }

        for term in &terms {
            let postings = self.index.postings(term);
            if postings.is_empty() {
                continue;
            }
            let idf = self.idf(term);
            for posting in postings.iter().filter(|p| filter(p.doc_id)) {
                let doc_len = self.index.document_length(posting.doc_id).unwrap_or(0);
                let score = self.term_score(posting.term_frequency(), doc_len, idf);
                *scores.entry(posting.doc_id).or_insert(0.0) += score;
            }
        }
        scores.retain(|_, s| *s != 0.0);

        tracing::debug!(
            query,
            terms = terms.len(),
            scored = scores.len(),
            "bm25 query scored"
        );
        scores
    }

    fn term_score(&self, tf: u32, doc_len: u32, idf: f32) -> f32 {
        let Bm25Params { k1, b } = self.params;
        let tf = tf as f32;
        let dl = doc_len as f32;
        let avgdl = self.index.safe_average_document_length();
        let norm = k1 * (1.0 - b + b * dl / avgdl);
        idf * (tf * (k1 + 1.0)) / (tf + norm)
    }
}

fn ranking(a: &(DocId, f32), b: &(DocId, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}
