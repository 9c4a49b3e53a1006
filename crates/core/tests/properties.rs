use aerosearch_core::bm25::idf;
use aerosearch_core::{evaluate, Bm25, DocId, InvertedIndex};
use proptest::prelude::*;
use std::collections::BTreeSet;

const VOCAB: [&str; 6] = ["alpha", "bravo", "charlie", "delta", "echo", "."];

fn corpus() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::collection::vec(0..VOCAB.len(), 1..16), 1..8).prop_map(|docs| {
        docs.into_iter()
            .map(|words| {
                words
                    .into_iter()
                    .map(|w| VOCAB[w])
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    })
}

fn index(docs: &[String]) -> InvertedIndex {
    InvertedIndex::build(docs.iter().enumerate().map(|(i, d)| (i as DocId, d.as_str())))
}

fn word() -> impl Strategy<Value = &'static str> {
    (0..VOCAB.len() - 1).prop_map(|i| VOCAB[i])
}

fn sub_query() -> impl Strategy<Value = String> {
    prop_oneof![
        word().prop_map(str::to_string),
        (word(), word()).prop_map(|(a, b)| format!("\"{a} {b}\"")),
        (word(), 0u32..5, word()).prop_map(|(a, n, b)| format!("{a} /{n} {b}")),
        (word(), word()).prop_map(|(a, b)| format!("{a} /s {b}")),
        (word(), word()).prop_map(|(a, b)| format!("{a} OR {b}")),
    ]
}

fn set(ids: Vec<DocId>) -> BTreeSet<DocId> {
    ids.into_iter().collect()
}

proptest! {
    #[test]
    fn distance_is_symmetric(docs in corpus(), a in word(), b in word(), n in 0u32..8) {
        let idx = index(&docs);
        prop_assert_eq!(
            evaluate(&idx, &format!("{a} /{n} {b}")),
            evaluate(&idx, &format!("{b} /{n} {a}"))
        );
    }

    #[test]
    fn sentence_is_symmetric(docs in corpus(), a in word(), b in word()) {
        let idx = index(&docs);
        prop_assert_eq!(
            evaluate(&idx, &format!("{a} /s {b}")),
            evaluate(&idx, &format!("{b} /s {a}"))
        );
    }

    #[test]
    fn and_is_subset_of_or(docs in corpus(), x in sub_query(), y in sub_query()) {
        let idx = index(&docs);
        let and = set(evaluate(&idx, &format!("({x}) AND ({y})")));
        let or = set(evaluate(&idx, &format!("({x}) OR ({y})")));
        prop_assert!(and.is_subset(&or));
    }

    #[test]
    fn not_excludes_right_side(docs in corpus(), x in sub_query(), y in sub_query()) {
        let idx = index(&docs);
        let diff = set(evaluate(&idx, &format!("({x}) NOT ({y})")));
        let right = set(evaluate(&idx, &format!("({y})")));
        prop_assert!(diff.is_disjoint(&right));
    }

    #[test]
    fn results_are_sorted_and_unique(docs in corpus(), x in sub_query()) {
        let idx = index(&docs);
        let ids = evaluate(&idx, &x);
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn bm25_monotone_in_term_frequency(tf in 1usize..10, len in 10usize..20) {
        let doc = |tf: usize| {
            let mut words = vec!["alpha"; tf];
            words.extend(std::iter::repeat("filler").take(len - tf));
            words.join(" ")
        };
        let score = |tf: usize| {
            let idx = InvertedIndex::build([
                (0, doc(tf)),
                (1, "bravo charlie".to_string()),
                (2, "alpha delta".to_string()),
            ]);
            Bm25::new(&idx).score("alpha", None)
                .into_iter()
                .find(|r| r.0 == 0)
                .map(|r| r.1)
                .unwrap_or(0.0)
        };
        prop_assert!(score(tf + 1) >= score(tf));
    }

    #[test]
    fn idf_strictly_decreasing_in_df((n, df) in (1usize..1000).prop_flat_map(|n| (Just(n), 0..n))) {
        prop_assert!(idf(n, df) > idf(n, df + 1));
        prop_assert!(idf(n, df + 1) >= 0.0);
    }
}
