//! Positional inverted index for boolean, proximity and BM25 retrieval.
//!
//! Postings carry every position of a term in a document, so phrase and
//! distance operators can be answered from the index alone. Document lengths
//! and sentence spans are recorded during the same pass.
//!
//! Document ids are caller-controlled. Indexing the same id twice is a contract
//! violation with undefined results: the later length and sentence spans win,
//! but both documents' postings are kept. A warning is logged when it happens.

use crate::config;
use crate::document::DocId;
use crate::text::Tokenizer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single entry in a term's postings list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Document containing the term.
    pub doc_id: DocId,
    /// Strictly ascending token positions of the term in the document.
    pub positions: Vec<u32>,
}

impl Posting {
    /// Number of times the term appears in this document.
    pub fn term_frequency(&self) -> u32 {
        self.positions.len() as u32
    }
}

/// Inclusive range of token positions covered by one sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceSpan {
    pub start: u32,
    pub end: u32,
}

impl SentenceSpan {
    pub fn contains(&self, position: u32) -> bool {
        self.start <= position && position <= self.end
    }

    /// Number of tokens in the sentence.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// Accumulates documents for a single [`InvertedIndex`].
///
/// The builder is consumed by [`IndexBuilder::build`], so an index can only be
/// populated once.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    tokenizer: Tokenizer,
    postings: HashMap<String, Vec<Posting>>,
    doc_lengths: HashMap<DocId, u32>,
    sentence_bounds: HashMap<DocId, Vec<SentenceSpan>>,
    doc_count: u32,
}

impl IndexBuilder {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            ..Self::default()
        }
    }

    /// Segment and index one document.
    pub fn add_document(&mut self, doc_id: DocId, text: &str) {
        let segmented = self.tokenizer.segment(text);
        let doc_len = segmented.len() as u32;

        if self.doc_lengths.insert(doc_id, doc_len).is_some() {
            tracing::warn!(
                doc_id,
                "duplicate document id: length and sentence spans overwritten, postings not merged"
            );
        }
        self.doc_count += 1;

        // sentence spans in position space; stop-word-only sentences have no span
        let mut bounds = Vec::with_capacity(segmented.sentence_count());
        let mut cursor = 0u32;
        for sentence in segmented.sentences() {
            if sentence.is_empty() {
                continue;
            }
            let len = sentence.len() as u32;
            bounds.push(SentenceSpan {
                start: cursor,
                end: cursor + len - 1,
            });
            cursor += len;
        }
        self.sentence_bounds.insert(doc_id, bounds);

        let mut positions: HashMap<String, Vec<u32>> = HashMap::new();
        for (i, token) in segmented.into_tokens().into_iter().enumerate() {
            positions.entry(token).or_default().push(i as u32);
        }
        for (term, positions) in positions {
            self.postings
                .entry(term)
                .or_default()
                .push(Posting { doc_id, positions });
        }
    }

    /// Finish the build: sort every postings list by document id and freeze.
    pub fn build(mut self) -> InvertedIndex {
        for postings in self.postings.values_mut() {
            postings.sort_by_key(|p| p.doc_id);
        }
        let total_doc_length: u64 = self.doc_lengths.values().map(|&l| l as u64).sum();
        let average_doc_length = if self.doc_count == 0 {
            0.0
        } else {
            total_doc_length as f32 / self.doc_count as f32
        };

        tracing::debug!(
            documents = self.doc_count,
            terms = self.postings.len(),
            average_doc_length,
            "index built"
        );

        InvertedIndex {
            tokenizer: self.tokenizer,
            postings: self.postings,
            doc_lengths: self.doc_lengths,
            sentence_bounds: self.sentence_bounds,
            doc_count: self.doc_count,
            total_doc_length,
            average_doc_length,
        }
    }
}

/// Read-only positional inverted index.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    tokenizer: Tokenizer,
    /// term → postings sorted by document id
    postings: HashMap<String, Vec<Posting>>,
    doc_lengths: HashMap<DocId, u32>,
    sentence_bounds: HashMap<DocId, Vec<SentenceSpan>>,
    doc_count: u32,
    total_doc_length: u64,
    average_doc_length: f32,
}

impl InvertedIndex {
    /// Starts a build with the given tokenizer.
    pub fn builder(tokenizer: Tokenizer) -> IndexBuilder {
        IndexBuilder::new(tokenizer)
    }

    /// Index every `(id, text)` pair with the default tokenizer.
    pub fn build<I, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = (DocId, S)>,
        S: AsRef<str>,
    {
        Self::build_with(Tokenizer::default(), documents)
    }

    /// Index every `(id, text)` pair with a custom tokenizer.
    pub fn build_with<I, S>(tokenizer: Tokenizer, documents: I) -> Self
    where
        I: IntoIterator<Item = (DocId, S)>,
        S: AsRef<str>,
    {
        let mut builder = IndexBuilder::new(tokenizer);
        for (doc_id, text) in documents {
            builder.add_document(doc_id, text.as_ref());
        }
        builder.build()
    }

    /// The tokenizer documents were indexed with; queries must use the same one.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Postings for `term`, sorted by document id. Unknown terms yield an empty slice.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Positions of `term` in one document, if it occurs there.
    pub fn positions(&self, term: &str, doc_id: DocId) -> Option<&[u32]> {
        let postings = self.postings(term);
        postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|i| postings[i].positions.as_slice())
    }

    /// Sentence spans of a document in position space. Unknown ids yield an empty slice.
    pub fn sentence_bounds(&self, doc_id: DocId) -> &[SentenceSpan] {
        self.sentence_bounds
            .get(&doc_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of documents passed to the build.
    pub fn document_count(&self) -> usize {
        self.doc_count as usize
    }

    /// Number of stop-word-free tokens in a document.
    pub fn document_length(&self, doc_id: DocId) -> Option<u32> {
        self.doc_lengths.get(&doc_id).copied()
    }

    /// Mean document length, computed once at build time.
    pub fn average_document_length(&self) -> f32 {
        self.average_doc_length
    }

    /// Sum of all document lengths.
    pub fn total_document_length(&self) -> u64 {
        self.total_doc_length
    }

    /// Number of documents containing `term`.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings(term).len()
    }

    /// Number of distinct indexed terms.
    pub fn vocabulary_size(&self) -> usize {
        self.postings.len()
    }

    /// Every indexed term with its postings, in no particular order.
    pub fn vocabulary(&self) -> impl Iterator<Item = (&str, &[Posting])> + '_ {
        self.postings.iter().map(|(t, p)| (t.as_str(), p.as_slice()))
    }

    pub fn contains_document(&self, doc_id: DocId) -> bool {
        self.doc_lengths.contains_key(&doc_id)
    }

    /// All indexed document ids in ascending order.
    pub fn document_ids(&self) -> Vec<DocId> {
        let mut ids: Vec<DocId> = self.doc_lengths.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Denominator guard for length normalization.
    pub(crate) fn safe_average_document_length(&self) -> f32 {
        self.average_doc_length + config::AVG_DOC_LEN_EPSILON
    }
}
