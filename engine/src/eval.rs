//! Ranking-quality evaluation against a relevance-judgment set.
//!
//! Conventions (documented and tested):
//! - A judgment grade >= 1 counts as relevant.
//! - Recall@k and nDCG@k are undefined for a query with zero relevant
//!   judgments; such queries are excluded from the corresponding aggregate
//!   means instead of being coerced to zero.
//! - MAP averages only over queries with at least one relevant judgment.
//! - A query absent from the judgment set is reported in `skipped` and
//!   excluded from every aggregate.

use crate::engine::SearchEngine;
use crate::error::QueryError;
use crate::rank::Model;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Relevance judgments: query id -> document id -> grade.
pub type Qrels = BTreeMap<String, HashMap<String, u32>>;

/// Ranked lists for a batch: query id -> (document id, score), best first.
pub type RunResults = BTreeMap<String, Vec<(String, f32)>>;

const REL_THRESHOLD: u32 = 1;

/// Gain function for nDCG.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Gain {
    /// gain = grade.
    #[default]
    Linear,
    /// gain = 2^grade - 1, emphasizing highly relevant documents.
    Exponential,
}

impl Gain {
    fn of(self, grade: u32) -> f64 {
        match self {
            Self::Linear => f64::from(grade),
            Self::Exponential => f64::from(2u32.saturating_pow(grade).saturating_sub(1)),
        }
    }
}

/// Parse whitespace-separated `qid docid grade` judgment lines. Malformed
/// lines are skipped, matching the reference loader.
pub fn parse_qrels<R: Read>(reader: R) -> std::io::Result<Qrels> {
    let mut qrels = Qrels::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let (Some(qid), Some(docid), Some(grade)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        let Ok(grade) = grade.parse::<u32>() else {
            continue;
        };
        qrels
            .entry(qid.to_string())
            .or_default()
            .insert(docid.to_string(), grade);
    }
    Ok(qrels)
}

pub fn load_qrels<P: AsRef<Path>>(path: P) -> std::io::Result<Qrels> {
    let qrels = parse_qrels(std::fs::File::open(path)?)?;
    tracing::info!(num_queries = qrels.len(), "loaded qrels");
    Ok(qrels)
}

/// Load one raw query per line; query ids are 1-based line numbers,
/// matching the reference evaluation's queries file.
pub fn load_queries<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<(String, String)>> {
    let text = std::fs::read_to_string(path)?;
    let queries: Vec<(String, String)> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .enumerate()
        .map(|(i, l)| ((i + 1).to_string(), l.trim().to_string()))
        .collect();
    tracing::info!(num_queries = queries.len(), "loaded queries");
    Ok(queries)
}

/// Per-query metric values at one cutoff depth.
#[derive(Debug, Clone, Serialize)]
pub struct QueryMetrics {
    pub precision: f64,
    /// `None` when the query has no relevant judgments.
    pub recall: Option<f64>,
    /// 0.0 when the query has no relevant judgments.
    pub average_precision: f64,
    /// `None` when the ideal DCG is zero.
    pub ndcg: Option<f64>,
    pub relevant_total: usize,
}

/// Metrics for a whole batch: per-query values plus aggregate means.
/// Immutable once produced.
#[derive(Debug, Serialize)]
pub struct MetricReport {
    pub k: usize,
    pub per_query: BTreeMap<String, QueryMetrics>,
    pub mean_precision: f64,
    pub mean_recall: f64,
    pub map: f64,
    pub mean_ndcg: f64,
    /// Queries with no entry in the judgment set, excluded from aggregates.
    pub skipped: Vec<String>,
    /// Queries whose scoring failed; the rest of the batch still counts.
    pub errors: BTreeMap<String, String>,
}

/// Evaluate one ranked list against one query's judgments.
pub fn evaluate_query(
    ranked: &[(String, f32)],
    judgments: &HashMap<String, u32>,
    k: usize,
    gain: Gain,
) -> QueryMetrics {
    let relevant_total = judgments
        .values()
        .filter(|&&g| g >= REL_THRESHOLD)
        .count();

    let grade = |docid: &str| judgments.get(docid).copied().unwrap_or(0);
    let topk = &ranked[..k.min(ranked.len())];

    let hits_at_k = topk
        .iter()
        .filter(|(d, _)| grade(d) >= REL_THRESHOLD)
        .count();
    let precision = if k == 0 { 0.0 } else { hits_at_k as f64 / k as f64 };

    let recall = (relevant_total > 0).then(|| hits_at_k as f64 / relevant_total as f64);

    // AP over the full ranked list: precision at each relevant rank,
    // divided by the total relevant count.
    let average_precision = if relevant_total == 0 {
        0.0
    } else {
        let mut hits = 0usize;
        let mut sum = 0.0;
        for (i, (docid, _)) in ranked.iter().enumerate() {
            if grade(docid) >= REL_THRESHOLD {
                hits += 1;
                sum += hits as f64 / (i + 1) as f64;
            }
        }
        sum / relevant_total as f64
    };

    let dcg: f64 = topk
        .iter()
        .enumerate()
        .map(|(i, (docid, _))| gain.of(grade(docid)) / ((i + 2) as f64).log2())
        .sum();
    let mut ideal: Vec<u32> = judgments.values().copied().collect();
    ideal.sort_unstable_by(|a, b| b.cmp(a));
    let idcg: f64 = ideal
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, &g)| gain.of(g) / ((i + 2) as f64).log2())
        .sum();
    let ndcg = (idcg > 0.0).then(|| dcg / idcg);

    QueryMetrics {
        precision,
        recall,
        average_precision,
        ndcg,
        relevant_total,
    }
}

/// Evaluate a batch of ranked lists against a judgment set.
pub fn evaluate_batch(results: &RunResults, qrels: &Qrels, k: usize, gain: Gain) -> MetricReport {
    let mut per_query = BTreeMap::new();
    let mut skipped = Vec::new();

    for (qid, ranked) in results {
        match qrels.get(qid) {
            Some(judgments) => {
                per_query.insert(qid.clone(), evaluate_query(ranked, judgments, k, gain));
            }
            None => {
                tracing::warn!(qid = qid.as_str(), "query missing from judgment set");
                skipped.push(qid.clone());
            }
        }
    }

    let mean = |values: Vec<f64>| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    };
    let mean_precision = mean(per_query.values().map(|m| m.precision).collect());
    let mean_recall = mean(per_query.values().filter_map(|m| m.recall).collect());
    let map = mean(
        per_query
            .values()
            .filter(|m| m.relevant_total > 0)
            .map(|m| m.average_precision)
            .collect(),
    );
    let mean_ndcg = mean(per_query.values().filter_map(|m| m.ndcg).collect());

    MetricReport {
        k,
        per_query,
        mean_precision,
        mean_recall,
        map,
        mean_ndcg,
        skipped,
        errors: BTreeMap::new(),
    }
}

/// Run a query batch under one model, fanning independent queries out to
/// the rayon pool. Per-query failures are isolated and returned alongside
/// the successful ranked lists.
pub fn run_batch(
    engine: &SearchEngine,
    model: &Model,
    queries: &[(String, String)],
    depth: usize,
) -> (RunResults, BTreeMap<String, QueryError>) {
    let outcomes: Vec<(String, Result<Vec<(String, f32)>, QueryError>)> = queries
        .par_iter()
        .map(|(qid, text)| {
            let outcome = engine.search(text, model, depth).map(|hits| {
                hits.into_iter().map(|h| (h.doc_id, h.score)).collect()
            });
            (qid.clone(), outcome)
        })
        .collect();

    let mut results = RunResults::new();
    let mut errors = BTreeMap::new();
    for (qid, outcome) in outcomes {
        match outcome {
            Ok(ranked) => {
                results.insert(qid, ranked);
            }
            Err(err) => {
                tracing::warn!(qid = qid.as_str(), %err, "query failed; continuing batch");
                errors.insert(qid, err);
            }
        }
    }
    (results, errors)
}

/// Convenience wrapper: run the batch and evaluate it in one step.
pub fn run_and_evaluate(
    engine: &SearchEngine,
    model: &Model,
    queries: &[(String, String)],
    qrels: &Qrels,
    k: usize,
    gain: Gain,
) -> MetricReport {
    let depth = k.max(10);
    let (results, errors) = run_batch(engine, model, queries, depth);
    let mut report = evaluate_batch(&results, qrels, k, gain);
    report.errors = errors
        .into_iter()
        .map(|(qid, err)| (qid, err.to_string()))
        .collect();
    report
}
