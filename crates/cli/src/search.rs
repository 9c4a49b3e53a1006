//! Ranked and boolean search over a built index.

use crate::expansion::{expand_with_synonyms, feedback_terms, with_feedback, Expansion};
use aerosearch_core::{
    Bm25, Bm25Params, DocId, InvertedIndex, QueryError, QueryEvaluator, QueryOptions, QueryWarning,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;

/// How a query string is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Free text ranked with BM25.
    #[default]
    Bm25,
    /// Boolean/proximity filter, then BM25 re-rank of the matches.
    #[serde(alias = "boolean")]
    Bool,
}

/// Output of a boolean search.
#[derive(Debug, Clone, Default)]
pub struct BooleanResults {
    /// Matching ids in ascending order.
    pub matched: Vec<DocId>,
    /// Matches ordered by BM25 over the query's words.
    pub ranked: Vec<(DocId, f32)>,
    pub warnings: Vec<QueryWarning>,
}

/// A built index with its scoring, evaluation and expansion settings.
#[derive(Debug, Clone, Copy)]
pub struct Searcher<'a> {
    index: &'a InvertedIndex,
    params: Bm25Params,
    options: QueryOptions,
    expansion: Expansion,
    allowed: Option<&'a HashSet<DocId>>,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a InvertedIndex, params: Bm25Params, options: QueryOptions) -> Self {
        Self {
            index,
            params,
            options,
            expansion: Expansion::default(),
            allowed: None,
        }
    }

    pub fn with_expansion(mut self, expansion: Expansion) -> Self {
        self.expansion = expansion;
        self
    }

    /// Never return documents outside `allowed`.
    pub fn restricted_to(mut self, allowed: &'a HashSet<DocId>) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn index(&self) -> &'a InvertedIndex {
        self.index
    }

    pub fn bm25(&self) -> Bm25<'a> {
        Bm25::with_params(self.index, self.params)
    }

    /// Every document sharing a word with `query`, best first.
    pub fn ranked(&self, query: &str) -> Vec<(DocId, f32)> {
        let query = self.expand(query);
        let ranked = self.bm25().score(&query, self.allowed);
        self.refine(&query, ranked, self.allowed)
    }

    /// Evaluate a boolean query and re-rank its matches.
    ///
    /// Only the words of terms and phrases that can contribute to a match
    /// are scored, so operators, proximity markers and negated operands
    /// never do.
    pub fn boolean(&self, query: &str) -> Result<BooleanResults, QueryError> {
        let query = self.expand(query);
        let evaluator = QueryEvaluator::with_options(self.index, self.options);
        let mut parsed = evaluator.parse(&query);
        if self.options.strict {
            parsed = parsed.into_strict()?;
        }
        let mut matched = evaluator.run(&parsed).doc_ids();
        if let Some(allowed) = self.allowed {
            matched.retain(|d| allowed.contains(d));
        }
        let candidates: HashSet<DocId> = matched.iter().copied().collect();
        let scored = parsed.terms().join(" ");
        let ranked = self.bm25().score(&scored, Some(&candidates));
        let ranked = self.refine(&scored, ranked, Some(&candidates));
        tracing::debug!(
            query = %query,
            matched = matched.len(),
            ranked = ranked.len(),
            "boolean search"
        );
        Ok(BooleanResults {
            matched,
            ranked,
            warnings: parsed.warnings,
        })
    }

    fn expand<'q>(&self, query: &'q str) -> Cow<'q, str> {
        if self.expansion.synonyms {
            expand_with_synonyms(query, self.index.tokenizer())
        } else {
            Cow::Borrowed(query)
        }
    }

    /// Score again with feedback terms mined from `ranked`, when enabled.
    fn refine(
        &self,
        query: &str,
        ranked: Vec<(DocId, f32)>,
        candidates: Option<&HashSet<DocId>>,
    ) -> Vec<(DocId, f32)> {
        let Some(feedback) = self.expansion.feedback else {
            return ranked;
        };
        let terms = feedback_terms(self.index, query, &ranked, feedback);
        if terms.is_empty() {
            return ranked;
        }
        let expanded = with_feedback(query, &terms);
        tracing::debug!(query, expanded = %expanded, "pseudo-relevance feedback");
        self.bm25().score(&expanded, candidates)
    }

    /// Run `query` in `mode` and return the ranked run.
    pub fn run(&self, mode: Mode, query: &str) -> Result<Vec<(DocId, f32)>, QueryError> {
        match mode {
            Mode::Bm25 => Ok(self.ranked(query)),
            Mode::Bool => self.boolean(query).map(|r| r.ranked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::Feedback;
    use aerosearch_core::demo;

    fn index() -> InvertedIndex {
        InvertedIndex::build(demo::DOCUMENTS)
    }

    #[test]
    fn test_ranked_demo_query() {
        let idx = index();
        let searcher = Searcher::new(&idx, Bm25Params::default(), QueryOptions::default());
        let ranked = searcher.ranked(demo::RANKED_QUERY);
        assert_eq!(ranked[0].0, 1);
    }

    #[test]
    fn test_boolean_reranks_matches_only() {
        let idx = index();
        let searcher = Searcher::new(&idx, Bm25Params::default(), QueryOptions::default());
        let results = searcher.boolean("landing OR go-around").unwrap();
        assert_eq!(results.matched, vec![1, 4, 5]);
        let mut ranked_ids: Vec<DocId> = results.ranked.iter().map(|&(d, _)| d).collect();
        assert_eq!(ranked_ids[0], 5);
        ranked_ids.sort_unstable();
        assert_eq!(ranked_ids, results.matched);
    }

    #[test]
    fn test_not_removes_matches() {
        let idx = index();
        let searcher = Searcher::new(&idx, Bm25Params::default(), QueryOptions::default());
        let results = searcher.boolean("landing NOT tailwind").unwrap();
        assert_eq!(results.matched, vec![5]);
        assert_eq!(results.ranked.len(), 1);
    }

    #[test]
    fn test_negated_words_do_not_affect_order() {
        let idx = InvertedIndex::build([
            (1, "Airframe icing in cruise; pitot tube clear."),
            (2, "Pitot icing; airspeed indication failed."),
            (3, "Light icing noted."),
        ]);
        let searcher = Searcher::new(&idx, Bm25Params::default(), QueryOptions::default());
        let results = searcher.boolean("icing NOT (pitot /s failed)").unwrap();
        assert_eq!(results.matched, vec![1, 3]);
        // scored on "icing" alone, the shorter narrative wins
        let ranked_ids: Vec<DocId> = results.ranked.iter().map(|&(d, _)| d).collect();
        assert_eq!(ranked_ids, vec![3, 1]);
        let alone = searcher.boolean("icing NOT landing").unwrap();
        assert_eq!(alone.ranked, searcher.ranked("icing")[..3].to_vec());
    }

    #[test]
    fn test_synonyms_widen_boolean_matches() {
        let idx = index();
        let plain = Searcher::new(&idx, Bm25Params::default(), QueryOptions::default());
        assert_eq!(plain.boolean("veer-off").unwrap().matched, vec![5]);
        let expanded = plain.with_expansion(Expansion {
            synonyms: true,
            ..Expansion::default()
        });
        assert_eq!(expanded.boolean("veer-off").unwrap().matched, vec![1, 5]);
        let ranked: Vec<DocId> = expanded.ranked("veer-off").iter().map(|&(d, _)| d).collect();
        assert!(ranked.contains(&1));
    }

    #[test]
    fn test_feedback_reaches_related_documents() {
        let idx = index();
        let plain = Searcher::new(&idx, Bm25Params::default(), QueryOptions::default());
        let ids = |ranked: Vec<(DocId, f32)>| ranked.into_iter().map(|(d, _)| d).collect::<Vec<_>>();
        assert_eq!(ids(plain.ranked("pitot")), vec![2]);

        // the seven alphabetically first words of doc 2 include "led", shared with doc 1
        let feedback = plain.with_expansion(Expansion {
            feedback: Some(Feedback { docs: 1, terms: 7 }),
            ..Expansion::default()
        });
        assert_eq!(ids(feedback.ranked("pitot")), vec![2, 1]);
        let results = feedback.boolean("pitot OR cfit").unwrap();
        assert_eq!(results.matched, vec![2, 4]);
        let mut reranked = ids(results.ranked);
        reranked.sort_unstable();
        assert_eq!(reranked, vec![2, 4]);
    }

    #[test]
    fn test_restriction_applies_to_both_modes() {
        let idx = index();
        let allowed: HashSet<DocId> = HashSet::from([4, 5]);
        let searcher = Searcher::new(&idx, Bm25Params::default(), QueryOptions::default())
            .restricted_to(&allowed);
        let ranked: Vec<DocId> = searcher.ranked("landing go-around").iter().map(|&(d, _)| d).collect();
        assert!(!ranked.is_empty());
        assert!(ranked.iter().all(|d| allowed.contains(d)));
        let results = searcher.boolean("landing OR go-around").unwrap();
        assert_eq!(results.matched, vec![4, 5]);
    }

    #[test]
    fn test_strict_rejects_unbalanced() {
        let idx = index();
        let options = QueryOptions {
            strict: true,
            ..QueryOptions::default()
        };
        let searcher = Searcher::new(&idx, Bm25Params::default(), options);
        assert!(matches!(
            searcher.boolean("(landing"),
            Err(QueryError::Malformed(QueryWarning::UnmatchedOpen))
        ));
        assert!(searcher.run(Mode::Bool, "landing").is_ok());
    }
}
