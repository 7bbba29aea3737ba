//! Ranking quality against externally supplied relevance judgments. Pure
//! functions of a ranked list and a relevant set; nothing here touches an index.

use crate::{DocId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One judged query: the documents a reviewer considers relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub query: String,
    pub relevant: HashSet<DocId>,
}

pub fn load_judgments<P: AsRef<Path>>(path: P) -> Result<Vec<Judgment>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn hits_in(retrieved: &[DocId], relevant: &HashSet<DocId>) -> usize {
    let unique: HashSet<DocId> = retrieved.iter().copied().collect();
    unique.iter().filter(|d| relevant.contains(d)).count()
}

/// |relevant ∩ retrieved| / |retrieved| over the whole list.
pub fn precision(retrieved: &[DocId], relevant: &HashSet<DocId>) -> f64 {
    let unique: HashSet<DocId> = retrieved.iter().copied().collect();
    if unique.is_empty() {
        return 0.0;
    }
    hits_in(retrieved, relevant) as f64 / unique.len() as f64
}

pub fn recall(retrieved: &[DocId], relevant: &HashSet<DocId>) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    hits_in(retrieved, relevant) as f64 / relevant.len() as f64
}

/// |relevant ∩ top k| / k
pub fn precision_at_k(ranked: &[DocId], relevant: &HashSet<DocId>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let top = &ranked[..k.min(ranked.len())];
    hits_in(top, relevant) as f64 / k as f64
}

pub fn recall_at_k(ranked: &[DocId], relevant: &HashSet<DocId>, k: usize) -> f64 {
    recall(&ranked[..k.min(ranked.len())], relevant)
}

pub fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

/// Uninterpolated AP: precision at each rank holding a relevant document,
/// summed and divided by |relevant|.
pub fn average_precision(ranked: &[DocId], relevant: &HashSet<DocId>) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let mut seen = HashSet::new();
    let mut found = 0usize;
    let mut sum = 0.0;
    for (i, doc) in ranked.iter().enumerate() {
        if relevant.contains(doc) && seen.insert(*doc) {
            found += 1;
            sum += found as f64 / (i + 1) as f64;
        }
    }
    sum / relevant.len() as f64
}

pub fn mean_average_precision(runs: &[QueryRun]) -> f64 {
    if runs.is_empty() {
        return 0.0;
    }
    runs.iter().map(|r| average_precision(&r.ranked, &r.relevant)).sum::<f64>() / runs.len() as f64
}

/// Binary-relevance NDCG@k with a log2(rank + 1) discount.
pub fn ndcg_at_k(ranked: &[DocId], relevant: &HashSet<DocId>, k: usize) -> f64 {
    let discount = |rank: usize| 1.0 / ((rank + 1) as f64).log2();
    let dcg: f64 = ranked
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, d)| relevant.contains(d))
        .map(|(i, _)| discount(i + 1))
        .sum();
    let ideal: f64 = (1..=relevant.len().min(k)).map(discount).sum();
    if ideal == 0.0 {
        return 0.0;
    }
    dcg / ideal
}

/// A query's ranked output paired with its judgment.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRun {
    pub query: String,
    pub ranked: Vec<DocId>,
    pub relevant: HashSet<DocId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub average_precision: f64,
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub ndcg_at_k: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemReport {
    pub k: usize,
    pub queries: Vec<QueryReport>,
    pub avg_precision: f64,
    pub avg_recall: f64,
    pub avg_f1: f64,
    pub map: f64,
    pub avg_precision_at_k: f64,
    pub avg_recall_at_k: f64,
    pub avg_ndcg_at_k: f64,
}

pub fn evaluate_query(run: &QueryRun, k: usize) -> QueryReport {
    let p = precision(&run.ranked, &run.relevant);
    let r = recall(&run.ranked, &run.relevant);
    QueryReport {
        query: run.query.clone(),
        precision: p,
        recall: r,
        f1: f1(p, r),
        average_precision: average_precision(&run.ranked, &run.relevant),
        precision_at_k: precision_at_k(&run.ranked, &run.relevant, k),
        recall_at_k: recall_at_k(&run.ranked, &run.relevant, k),
        ndcg_at_k: ndcg_at_k(&run.ranked, &run.relevant, k),
    }
}

pub fn evaluate_system(runs: &[QueryRun], k: usize) -> SystemReport {
    let queries: Vec<QueryReport> = runs.iter().map(|r| evaluate_query(r, k)).collect();
    let mean = |f: fn(&QueryReport) -> f64| {
        if queries.is_empty() {
            0.0
        } else {
            queries.iter().map(f).sum::<f64>() / queries.len() as f64
        }
    };
    SystemReport {
        k,
        avg_precision: mean(|q| q.precision),
        avg_recall: mean(|q| q.recall),
        avg_f1: mean(|q| q.f1),
        map: mean(|q| q.average_precision),
        avg_precision_at_k: mean(|q| q.precision_at_k),
        avg_recall_at_k: mean(|q| q.recall_at_k),
        avg_ndcg_at_k: mean(|q| q.ndcg_at_k),
        queries,
    }
}
