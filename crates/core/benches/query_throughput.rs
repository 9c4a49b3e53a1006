//! Query throughput benchmark over a synthetic narrative corpus.
//! Measures index build rate and QPS for BM25, boolean and proximity queries.
//!
//! Usage: cargo bench --bench query_throughput [-- <documents>]

use aerosearch_core::evaluation::evaluate_run;
use aerosearch_core::{demo, Bm25, DocId, InvertedIndex, QueryEvaluator};
use std::collections::{HashMap, HashSet};
use std::hint::black_box;
use std::time::Instant;

const DEFAULT_DOCS: usize = 50_000;
const ROUNDS: usize = 200;

/// Stitch demo narratives together so documents differ in length and term mix.
fn synthetic_corpus(n: usize) -> Vec<(DocId, String)> {
    let texts: Vec<&str> = demo::DOCUMENTS.iter().map(|&(_, t)| t).collect();
    (0..n)
        .map(|i| {
            let parts = 1 + i % 3;
            let text = (0..parts)
                .map(|p| texts[(i * 7 + p * 3) % texts.len()])
                .collect::<Vec<_>>()
                .join(" ");
            (i as DocId + 1, text)
        })
        .collect()
}

fn report(label: &str, queries: usize, elapsed: std::time::Duration) {
    let qps = queries as f64 / elapsed.as_secs_f64();
    let avg_latency_us = elapsed.as_micros() as f64 / queries as f64;
    println!("  {label:<28} | QPS: {qps:>9.0} | Avg latency: {avg_latency_us:>8.1} us");
}

fn main() {
    let n: usize = std::env::args()
        .skip(1)
        .find_map(|a| a.parse().ok())
        .unwrap_or(DEFAULT_DOCS);

    println!("=== aerosearch query throughput ===");
    println!();
    println!("--- Index Construction ---");
    let docs = synthetic_corpus(n);
    let t0 = Instant::now();
    let index = InvertedIndex::build(docs.iter().map(|(id, t)| (*id, t.as_str())));
    let build_time = t0.elapsed();
    println!(
        "Build time: {:.3}s ({:.0} docs/s)",
        build_time.as_secs_f64(),
        n as f64 / build_time.as_secs_f64()
    );
    println!("Vocabulary size: {} terms", index.vocabulary_size());
    println!("Avg doc length: {:.1} tokens", index.average_document_length());

    println!();
    println!("--- Retrieval ({n} documents, {ROUNDS} rounds) ---");
    let bm25 = Bm25::new(&index);

    let t0 = Instant::now();
    for _ in 0..ROUNDS {
        black_box(bm25.top_k(demo::RANKED_QUERY, None, 10));
    }
    report("BM25 top-10", ROUNDS, t0.elapsed());

    let evaluator = QueryEvaluator::new(&index);
    for (query, _) in demo::BOOLEAN_QUERIES {
        let t0 = Instant::now();
        for _ in 0..ROUNDS {
            black_box(evaluator.evaluate_lenient(query));
        }
        report(&query.chars().take(28).collect::<String>(), ROUNDS, t0.elapsed());
    }

    let (query, _) = demo::BOOLEAN_QUERIES[1];
    let t0 = Instant::now();
    for _ in 0..ROUNDS {
        let matched: HashSet<DocId> = evaluator.evaluate_lenient(query).doc_ids.into_iter().collect();
        black_box(bm25.top_k(query, Some(&matched), 10));
    }
    report("boolean + BM25 re-rank", ROUNDS, t0.elapsed());

    // Sanity check on the canonical corpus: document 1 is the only relevant answer.
    println!();
    println!("--- Demo corpus ranking quality ---");
    let demo_index = InvertedIndex::build(demo::DOCUMENTS);
    let run: Vec<DocId> = Bm25::new(&demo_index)
        .score(demo::RANKED_QUERY, None)
        .into_iter()
        .map(|(d, _)| d)
        .collect();
    let metrics = evaluate_run(&run, &HashMap::from([(1, 1)]));
    println!(
        "  nDCG@10 = {:.4} | MAP = {:.4} | R@10 = {:.4}",
        metrics.ndcg_at_10, metrics.map, metrics.recall_at_10
    );

    println!();
    println!("=== Benchmark complete ===");
}
