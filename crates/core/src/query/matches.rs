//! Positional match sets.
//!
//! Every sub-expression evaluates to the documents it matches plus, for each
//! document, the token positions that produced the match. Boolean operators
//! combine the document sets; proximity operators compare the positions.
//!
//! Proximity checks compare every left position with every right position in
//! a candidate document, `O(|left| * |right|)` per document. Occurrence counts
//! per document are small in narrative corpora, so no merge-based algorithm is
//! used.

use crate::document::DocId;
use crate::index::InvertedIndex;
use std::collections::BTreeMap;

/// Documents matched by a sub-expression with their match positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    // positions sorted and deduplicated
    docs: BTreeMap<DocId, Vec<u32>>,
}

impl Matches {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Documents containing `term`, with its positions.
    pub fn term(index: &InvertedIndex, term: &str) -> Self {
        Self {
            docs: index
                .postings(term)
                .iter()
                .map(|p| (p.doc_id, p.positions.clone()))
                .collect(),
        }
    }

    /// Documents where `words` occur at consecutive positions.
    ///
    /// The positions of a match are every position covered by an occurrence.
    pub fn phrase(index: &InvertedIndex, words: &[String]) -> Self {
        let Some((first, rest)) = words.split_first() else {
            return Self::empty();
        };
        if rest.iter().any(|w| index.postings(w).is_empty()) {
            return Self::empty();
        }
        let mut docs = BTreeMap::new();
        'docs: for posting in index.postings(first) {
            let mut starts = posting.positions.clone();
            for (offset, word) in rest.iter().enumerate() {
                let Some(positions) = index.positions(word, posting.doc_id) else {
                    continue 'docs;
                };
                let shift = offset as u32 + 1;
                starts.retain(|&p| positions.binary_search(&(p + shift)).is_ok());
                if starts.is_empty() {
                    continue 'docs;
                }
            }
            let len = words.len() as u32;
            let mut covered: Vec<u32> = starts.iter().flat_map(|&s| s..s + len).collect();
            covered.sort_unstable();
            covered.dedup();
            docs.insert(posting.doc_id, covered);
        }
        Self { docs }
    }

    /// Intersection of documents; positions of both sides are kept.
    pub fn and(self, other: Self) -> Self {
        let mut other = other.docs;
        let docs = self
            .docs
            .into_iter()
            .filter_map(|(doc, left)| other.remove(&doc).map(|right| (doc, merge(left, right))))
            .collect();
        Self { docs }
    }

    /// Union of documents and positions.
    pub fn or(self, other: Self) -> Self {
        let mut docs = self.docs;
        for (doc, right) in other.docs {
            match docs.remove(&doc) {
                Some(left) => docs.insert(doc, merge(left, right)),
                None => docs.insert(doc, right),
            };
        }
        Self { docs }
    }

    /// Documents of `self` that `other` does not match.
    pub fn not(self, other: &Self) -> Self {
        let mut docs = self.docs;
        docs.retain(|doc, _| !other.docs.contains_key(doc));
        Self { docs }
    }

    /// Documents where some position of each side lies at most `distance` apart.
    pub fn within(self, other: Self, distance: u32) -> Self {
        self.and_where(other, |left, right| {
            left.iter()
                .any(|&x| right.iter().any(|&y| x.abs_diff(y) <= distance))
        })
    }

    /// Documents where one sentence contains a position of each side.
    pub fn same_sentence(self, other: Self, index: &InvertedIndex) -> Self {
        let mut docs = BTreeMap::new();
        let mut other = other.docs;
        for (doc, left) in self.docs {
            let Some(right) = other.remove(&doc) else {
                continue;
            };
            let hit = index.sentence_bounds(doc).iter().any(|span| {
                left.iter().any(|&x| span.contains(x)) && right.iter().any(|&y| span.contains(y))
            });
            if hit {
                docs.insert(doc, merge(left, right));
            }
        }
        Self { docs }
    }

    fn and_where(self, other: Self, keep: impl Fn(&[u32], &[u32]) -> bool) -> Self {
        let mut other = other.docs;
        let docs = self
            .docs
            .into_iter()
            .filter_map(|(doc, left)| {
                let right = other.remove(&doc)?;
                keep(&left, &right).then(|| (doc, merge(left, right)))
            })
            .collect();
        Self { docs }
    }

    /// Matched document ids in ascending order.
    pub fn doc_ids(&self) -> Vec<DocId> {
        self.docs.keys().copied().collect()
    }

    /// Match positions within one document.
    pub fn positions(&self, doc_id: DocId) -> Option<&[u32]> {
        self.docs.get(&doc_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

fn merge(mut left: Vec<u32>, right: Vec<u32>) -> Vec<u32> {
    left.extend(right);
    left.sort_unstable();
    left.dedup();
    left
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> InvertedIndex {
        InvertedIndex::build([
            (1, "alpha beta gamma. delta alpha."),
            (2, "beta alpha"),
            (3, "gamma"),
        ])
    }

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_term() {
        let idx = index();
        let m = Matches::term(&idx, "alpha");
        assert_eq!(m.doc_ids(), vec![1, 2]);
        assert_eq!(m.positions(1), Some(&[0u32, 4][..]));
        assert!(Matches::term(&idx, "missing").is_empty());
    }

    #[test]
    fn test_phrase_positive_and_negative() {
        let idx = index();
        let m = Matches::phrase(&idx, &words("alpha beta"));
        assert_eq!(m.doc_ids(), vec![1]);
        assert_eq!(m.positions(1), Some(&[0u32, 1][..]));
        // reversed order only occurs in doc 2
        assert_eq!(Matches::phrase(&idx, &words("beta alpha")).doc_ids(), vec![2]);
        assert!(Matches::phrase(&idx, &words("alpha gamma")).is_empty());
        assert!(Matches::phrase(&idx, &words("alpha missing")).is_empty());
        assert!(Matches::phrase(&idx, &[]).is_empty());
    }

    #[test]
    fn test_phrase_crosses_sentences() {
        let idx = index();
        assert_eq!(Matches::phrase(&idx, &words("gamma delta")).doc_ids(), vec![1]);
    }

    #[test]
    fn test_boolean_combinators() {
        let idx = index();
        let alpha = || Matches::term(&idx, "alpha");
        let gamma = || Matches::term(&idx, "gamma");
        assert_eq!(alpha().and(gamma()).doc_ids(), vec![1]);
        assert_eq!(alpha().or(gamma()).doc_ids(), vec![1, 2, 3]);
        assert_eq!(alpha().not(&gamma()).doc_ids(), vec![2]);
        assert_eq!(alpha().and(gamma()).positions(1), Some(&[0u32, 2, 4][..]));
    }

    #[test]
    fn test_within_symmetric() {
        let idx = index();
        let a = || Matches::term(&idx, "alpha");
        let g = || Matches::term(&idx, "gamma");
        assert_eq!(a().within(g(), 1).doc_ids(), Vec::<DocId>::new());
        assert_eq!(a().within(g(), 2).doc_ids(), vec![1]);
        assert_eq!(g().within(a(), 2).doc_ids(), vec![1]);
    }

    #[test]
    fn test_same_sentence() {
        let idx = index();
        let d = Matches::term(&idx, "delta");
        let b = Matches::term(&idx, "beta");
        assert!(d.clone().same_sentence(b, &idx).is_empty());
        let a = Matches::term(&idx, "alpha");
        assert_eq!(d.same_sentence(a, &idx).doc_ids(), vec![1]);
    }
}
