//! Ranking quality metrics for offline evaluation against graded labels.
//!
//! Gains follow the exponential form `2^rel - 1`; the ideal ranking for nDCG
//! is built from every judged grade, not only the retrieved ones.

use crate::config;
use crate::document::DocId;
use serde::Serialize;
use std::collections::HashMap;

/// Compute DCG@k with exponential gain.
pub fn dcg_at_k(relevances: &[u32], k: usize) -> f64 {
    relevances
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, &rel)| {
            let rank = i as f64 + 2.0; // log2(i+2) because i is 0-indexed
            (2f64.powi(rel as i32) - 1.0) / rank.log2()
        })
        .sum()
}

/// nDCG@k of a ranked list of grades against all judged grades.
///
/// The ideal DCG is computed from every judged grade, not from the grades of
/// the retrieved documents, so judged documents missing from `ranked` pull
/// the score below 1.0.
pub fn ndcg_at_k(ranked: &[u32], judged: &[u32], k: usize) -> f64 {
    let mut ideal = judged.to_vec();
    ideal.sort_unstable_by(|a, b| b.cmp(a));
    let idcg = dcg_at_k(&ideal, k);
    if idcg < 1e-10 {
        0.0
    } else {
        dcg_at_k(ranked, k) / idcg
    }
}

/// Mean of precision at each relevant rank; 0.0 when nothing relevant was retrieved.
pub fn average_precision(relevant: &[bool]) -> f64 {
    let mut hits = 0usize;
    let mut sum = 0.0;
    for (i, &r) in relevant.iter().enumerate() {
        if r {
            hits += 1;
            sum += hits as f64 / (i + 1) as f64;
        }
    }
    if hits == 0 {
        0.0
    } else {
        sum / hits as f64
    }
}

/// Fraction of all relevant documents found in the first `k` results.
pub fn recall_at_k(relevant: &[bool], total_relevant: usize, k: usize) -> f64 {
    let found = relevant.iter().take(k).filter(|&&r| r).count();
    found as f64 / total_relevant.max(1) as f64
}

/// Metrics of one ranked run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunMetrics {
    pub ndcg_at_10: f64,
    pub map: f64,
    pub recall_at_10: f64,
    pub total_relevant: usize,
}

/// Score a ranked list of document ids against graded labels (missing ids are grade 0).
pub fn evaluate_run(run: &[DocId], labels: &HashMap<DocId, u32>) -> RunMetrics {
    let grades: Vec<u32> = run
        .iter()
        .map(|id| labels.get(id).copied().unwrap_or(0))
        .collect();
    let relevant: Vec<bool> = grades.iter().map(|&g| g > 0).collect();
    let judged: Vec<u32> = labels.values().copied().collect();
    let total_relevant = judged.iter().filter(|&&g| g > 0).count();
    let k = config::EVAL_CUTOFF;
    RunMetrics {
        ndcg_at_10: ndcg_at_k(&grades, &judged, k),
        map: average_precision(&relevant),
        recall_at_10: recall_at_k(&relevant, total_relevant, k),
        total_relevant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_dcg() {
        // (2^3-1)/log2(2) + (2^1-1)/log2(3)
        let expected = 7.0 + 1.0 / 3f64.log2();
        assert!(close(dcg_at_k(&[3, 1], 10), expected));
        assert!(close(dcg_at_k(&[3, 1], 1), 7.0));
        assert_eq!(dcg_at_k(&[], 10), 0.0);
    }

    #[test]
    fn test_ndcg_perfect_and_reversed() {
        assert!(close(ndcg_at_k(&[2, 1, 0], &[2, 1], 10), 1.0));
        let reversed = ndcg_at_k(&[0, 1, 2], &[2, 1], 10);
        assert!(reversed > 0.0 && reversed < 1.0);
        assert_eq!(ndcg_at_k(&[0, 0], &[0], 10), 0.0);
    }

    #[test]
    fn test_ndcg_penalizes_missing_relevant() {
        // a relevant doc that was never retrieved lowers the score
        assert!(ndcg_at_k(&[2], &[2, 2], 10) < 1.0);
    }

    #[test]
    fn test_average_precision() {
        assert!(close(average_precision(&[true, false, true]), (1.0 + 2.0 / 3.0) / 2.0));
        assert_eq!(average_precision(&[false, false]), 0.0);
    }

    #[test]
    fn test_recall() {
        assert!(close(recall_at_k(&[true, false, true], 4, 2), 0.25));
        assert_eq!(recall_at_k(&[], 0, 10), 0.0);
    }

    #[test]
    fn test_evaluate_run() {
        let labels: HashMap<DocId, u32> = [(1, 2), (4, 1), (7, 0)].into_iter().collect();
        let m = evaluate_run(&[1, 3, 4], &labels);
        assert_eq!(m.total_relevant, 2);
        assert!(close(m.recall_at_10, 1.0));
        assert!(close(m.map, (1.0 + 2.0 / 3.0) / 2.0));
        assert!(m.ndcg_at_10 > 0.9 && m.ndcg_at_10 < 1.0);
    }
}
