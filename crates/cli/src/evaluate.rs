//! Offline evaluation of queries against graded relevance labels.

use crate::corpus::CorpusError;
use crate::search::{Mode, Searcher};
use aerosearch_core::evaluation::{evaluate_run, RunMetrics};
use aerosearch_core::{DocId, QueryError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// One line of a labels file:
/// `{"query": "...", "mode": "bm25" | "bool", "relevance": {"<doc id>": grade}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Judgment {
    pub query: String,
    #[serde(default)]
    pub mode: Mode,
    pub relevance: HashMap<DocId, u32>,
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Read(#[from] CorpusError),
    #[error("query {query:?}: {source}")]
    Query {
        query: String,
        #[source]
        source: QueryError,
    },
}

/// Metrics of one judged query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub mode: Mode,
    pub retrieved: usize,
    #[serde(flatten)]
    pub metrics: RunMetrics,
}

/// Per-query reports and their means.
#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub queries: Vec<QueryReport>,
    pub mean_ndcg_at_10: f64,
    pub mean_map: f64,
    pub mean_recall_at_10: f64,
}

/// Read judgments, one JSON object per non-blank line.
pub fn load_judgments(path: &Path) -> Result<Vec<Judgment>, EvalError> {
    let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    let mut judgments = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| CorpusError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let judgment = serde_json::from_str(&line).map_err(|source| CorpusError::JsonLine {
            path: path.to_path_buf(),
            line: i + 1,
            source,
        })?;
        judgments.push(judgment);
    }
    Ok(judgments)
}

/// Run every judged query and score its ranking.
pub fn evaluate(searcher: &Searcher<'_>, judgments: &[Judgment]) -> Result<EvalReport, EvalError> {
    let mut queries = Vec::with_capacity(judgments.len());
    for judgment in judgments {
        let run: Vec<DocId> = searcher
            .run(judgment.mode, &judgment.query)
            .map_err(|source| EvalError::Query {
                query: judgment.query.clone(),
                source,
            })?
            .into_iter()
            .map(|(doc, _)| doc)
            .collect();
        let metrics = evaluate_run(&run, &judgment.relevance);
        tracing::debug!(query = %judgment.query, ndcg = metrics.ndcg_at_10, "query evaluated");
        queries.push(QueryReport {
            query: judgment.query.clone(),
            mode: judgment.mode,
            retrieved: run.len(),
            metrics,
        });
    }

    let mean = |f: fn(&RunMetrics) -> f64| {
        if queries.is_empty() {
            0.0
        } else {
            queries.iter().map(|q| f(&q.metrics)).sum::<f64>() / queries.len() as f64
        }
    };
    let report = EvalReport {
        mean_ndcg_at_10: mean(|m| m.ndcg_at_10),
        mean_map: mean(|m| m.map),
        mean_recall_at_10: mean(|m| m.recall_at_10),
        queries,
    };
    tracing::info!(
        queries = report.queries.len(),
        ndcg_at_10 = report.mean_ndcg_at_10,
        map = report.mean_map,
        "evaluation complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerosearch_core::{demo, Bm25Params, InvertedIndex, QueryOptions};
    use tempfile::TempDir;

    #[test]
    fn test_judgment_parsing() {
        let j: Judgment =
            serde_json::from_str(r#"{"query": "icing", "relevance": {"2": 3, "4": 0}}"#).unwrap();
        assert_eq!(j.mode, Mode::Bm25);
        assert_eq!(j.relevance[&2], 3);
        let j: Judgment =
            serde_json::from_str(r#"{"query": "x", "mode": "boolean", "relevance": {}}"#).unwrap();
        assert_eq!(j.mode, Mode::Bool);
    }

    #[test]
    fn test_load_judgments_errors() {
        let tmp_dir = TempDir::new().expect("Failed to create temp dir");
        let missing = tmp_dir.path().join("labels.jsonl");
        assert!(matches!(
            load_judgments(&missing),
            Err(EvalError::Read(CorpusError::Io { .. }))
        ));

        let bad = tmp_dir.path().join("bad.jsonl");
        std::fs::write(&bad, "{\"query\": \"icing\", \"relevance\": {}}\n\n{\"query\": 1}\n")
            .expect("Failed to write fixture");
        match load_judgments(&bad) {
            Err(EvalError::Read(CorpusError::JsonLine { line, .. })) => assert_eq!(line, 3),
            other => panic!("expected a JSON line error, got {other:?}"),
        }
    }

    #[test]
    fn test_evaluate_demo() {
        let index = InvertedIndex::build(demo::DOCUMENTS);
        let searcher = Searcher::new(&index, Bm25Params::default(), QueryOptions::default());
        let judgments = vec![
            Judgment {
                query: demo::RANKED_QUERY.to_string(),
                mode: Mode::Bm25,
                relevance: HashMap::from([(1, 2)]),
            },
            Judgment {
                query: "incursion AND taxiway".to_string(),
                mode: Mode::Bool,
                relevance: HashMap::from([(3, 1), (5, 1)]),
            },
        ];
        let report = evaluate(&searcher, &judgments).unwrap();
        let first = &report.queries[0].metrics;
        assert!((first.ndcg_at_10 - 1.0).abs() < 1e-9);
        assert!((first.map - 1.0).abs() < 1e-9);
        let second = &report.queries[1];
        assert_eq!(second.retrieved, 1);
        assert!((second.metrics.recall_at_10 - 0.5).abs() < 1e-9);
        assert!((report.mean_map - 1.0).abs() < 1e-9);
    }
}
