//! Query expansion: aviation synonyms and pseudo-relevance feedback.

use aerosearch_core::{config, DocId, InvertedIndex, Tokenizer};
use std::borrow::Cow;
use std::collections::HashSet;

/// Phrases OR-ed into a query that mentions the key word.
pub const AVIATION_SYNONYMS: [(&str, &[&str]); 7] = [
    ("veer-off", &["runway excursion", "runway veer off", "runway overrun"]),
    ("overrun", &["long landing", "runway excursion"]),
    ("incursion", &["runway incursion", "surface incident"]),
    ("cfit", &["controlled flight into terrain", "terrain impact"]),
    ("icing", &["ice accretion", "airframe icing", "pitot icing"]),
    ("tailwind", &["downwind landing"]),
    ("unstable", &["unstabilized", "unstable approach"]),
];

/// Pseudo-relevance feedback settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    /// Top-ranked documents mined for terms.
    pub docs: usize,
    /// Terms appended to the query.
    pub terms: usize,
}

impl Default for Feedback {
    fn default() -> Self {
        Self {
            docs: config::FEEDBACK_DOCS,
            terms: config::FEEDBACK_TERMS,
        }
    }
}

/// Expansions applied before scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Expansion {
    pub synonyms: bool,
    pub feedback: Option<Feedback>,
}

/// `(query) OR ("s1" OR "s2" ...)` over the synonyms of the query's words,
/// or `query` unchanged when none of its words has any.
///
/// The result is valid boolean syntax, so it can be used in either mode.
pub fn expand_with_synonyms<'q>(query: &'q str, tokenizer: &Tokenizer) -> Cow<'q, str> {
    let words: HashSet<String> = tokenizer.tokenize(query).into_iter().collect();
    let phrases: Vec<String> = AVIATION_SYNONYMS
        .iter()
        .filter(|(word, _)| words.contains(*word))
        .flat_map(|(_, synonyms)| synonyms.iter().map(|s| format!("\"{s}\"")))
        .collect();
    if phrases.is_empty() {
        return Cow::Borrowed(query);
    }
    Cow::Owned(format!("({query}) OR ({})", phrases.join(" OR ")))
}

/// The words occurring most often in the first `feedback.docs` of `ranked`.
///
/// Query words and words shorter than [`config::FEEDBACK_MIN_TERM_LEN`] are
/// skipped. Equal counts are ordered alphabetically.
pub fn feedback_terms(
    index: &InvertedIndex,
    query: &str,
    ranked: &[(DocId, f32)],
    feedback: Feedback,
) -> Vec<String> {
    let top: HashSet<DocId> = ranked.iter().take(feedback.docs).map(|&(d, _)| d).collect();
    if top.is_empty() || feedback.terms == 0 {
        return Vec::new();
    }
    let query_words: HashSet<String> = index.tokenizer().tokenize(query).into_iter().collect();
    let mut counts: Vec<(u32, &str)> = index
        .vocabulary()
        .filter(|(term, _)| {
            term.chars().count() >= config::FEEDBACK_MIN_TERM_LEN && !query_words.contains(*term)
        })
        .map(|(term, postings)| {
            let count = postings
                .iter()
                .filter(|p| top.contains(&p.doc_id))
                .map(|p| p.term_frequency())
                .sum();
            (count, term)
        })
        .filter(|&(count, _)| count > 0)
        .collect();
    counts.sort_unstable_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    counts
        .into_iter()
        .take(feedback.terms)
        .map(|(_, term)| term.to_string())
        .collect()
}

/// `query OR (t1 OR t2 ...)`, or `query` when `terms` is empty.
pub fn with_feedback<'q>(query: &'q str, terms: &[String]) -> Cow<'q, str> {
    if terms.is_empty() {
        Cow::Borrowed(query)
    } else {
        Cow::Owned(format!("{query} OR ({})", terms.join(" OR ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonyms_for_known_words() {
        let tokenizer = Tokenizer::default();
        assert_eq!(
            expand_with_synonyms("Tailwind landing", &tokenizer),
            r#"(Tailwind landing) OR ("downwind landing")"#
        );
        assert_eq!(
            expand_with_synonyms("veer-off", &tokenizer),
            r#"(veer-off) OR ("runway excursion" OR "runway veer off" OR "runway overrun")"#
        );
    }

    #[test]
    fn test_no_synonyms_borrows_query() {
        let expanded = expand_with_synonyms("engine fire", &Tokenizer::default());
        assert!(matches!(expanded, Cow::Borrowed("engine fire")));
    }

    #[test]
    fn test_feedback_terms_by_count() {
        let index = InvertedIndex::build([
            (1, "Carburetor icing; carburetor heat not applied."),
            (2, "Carburetor icing in descent."),
            (3, "Fuel exhaustion on final."),
        ]);
        let ranked = [(1, 2.0), (2, 1.5), (3, 0.1)];
        let feedback = Feedback { docs: 2, terms: 2 };
        assert_eq!(
            feedback_terms(&index, "icing", &ranked, feedback),
            vec!["carburetor", "applied"]
        );
        // only the first document is mined
        let feedback = Feedback { docs: 1, terms: 10 };
        assert_eq!(
            feedback_terms(&index, "icing", &ranked, feedback),
            vec!["carburetor", "applied", "heat", "not"]
        );
        assert!(feedback_terms(&index, "icing", &[], Feedback::default()).is_empty());
    }

    #[test]
    fn test_with_feedback() {
        let terms = vec!["carburetor".to_string(), "heat".to_string()];
        assert_eq!(with_feedback("icing", &terms), "icing OR (carburetor OR heat)");
        assert_eq!(with_feedback("icing", &[]), "icing");
    }
}
