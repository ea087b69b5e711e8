//! Per-query IR metrics and their aggregation over a dataset.

use std::collections::HashSet;

use docrag_core::types::MetricSet;

pub const RECALL_AT_5: &str = "recall_at_5";
pub const RECALL_AT_10: &str = "recall_at_10";
pub const PRECISION_AT_5: &str = "precision_at_5";
pub const PRECISION_AT_10: &str = "precision_at_10";
pub const RECIPROCAL_RANK: &str = "reciprocal_rank";
pub const AVERAGE_PRECISION: &str = "average_precision";
pub const MRR: &str = "mrr";
pub const MAP: &str = "map";

fn hits_in_top_k(relevant: &HashSet<&str>, retrieved: &[String], k: usize) -> usize {
    let top: HashSet<&str> = retrieved.iter().take(k).map(String::as_str).collect();
    top.intersection(relevant).count()
}

/// Share of the relevant ids found in the first `k` retrieved.
pub fn recall_at_k(relevant: &HashSet<&str>, retrieved: &[String], k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    hits_in_top_k(relevant, retrieved, k) as f64 / relevant.len() as f64
}

/// Share of the first `k` retrieved that are relevant. Short lists are not
/// penalised: the denominator is `min(k, retrieved.len())`.
pub fn precision_at_k(relevant: &HashSet<&str>, retrieved: &[String], k: usize) -> f64 {
    if k == 0 || retrieved.is_empty() {
        return 0.0;
    }
    hits_in_top_k(relevant, retrieved, k) as f64 / k.min(retrieved.len()) as f64
}

pub fn reciprocal_rank(relevant: &HashSet<&str>, retrieved: &[String]) -> f64 {
    retrieved
        .iter()
        .position(|id| relevant.contains(id.as_str()))
        .map_or(0.0, |i| 1.0 / (i + 1) as f64)
}

/// Mean of the precision at each relevant hit, over the number of relevant ids.
pub fn average_precision(relevant: &HashSet<&str>, retrieved: &[String]) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let mut found = 0usize;
    let mut sum = 0.0;
    for (i, id) in retrieved.iter().enumerate() {
        if relevant.contains(id.as_str()) {
            found += 1;
            sum += found as f64 / (i + 1) as f64;
        }
    }
    if found == 0 {
        0.0
    } else {
        sum / relevant.len() as f64
    }
}

/// The full metric set for one query.
pub fn calculate_metrics(relevant: &[String], retrieved: &[String]) -> MetricSet {
    let relevant: HashSet<&str> = relevant.iter().map(String::as_str).collect();
    MetricSet::from([
        (RECALL_AT_5.to_string(), recall_at_k(&relevant, retrieved, 5)),
        (RECALL_AT_10.to_string(), recall_at_k(&relevant, retrieved, 10)),
        (PRECISION_AT_5.to_string(), precision_at_k(&relevant, retrieved, 5)),
        (PRECISION_AT_10.to_string(), precision_at_k(&relevant, retrieved, 10)),
        (RECIPROCAL_RANK.to_string(), reciprocal_rank(&relevant, retrieved)),
        (AVERAGE_PRECISION.to_string(), average_precision(&relevant, retrieved)),
    ])
}

/// Arithmetic mean per metric. Keys come from the first set;
/// `reciprocal_rank` and `average_precision` are reported as `mrr` and `map`.
pub fn aggregate_metrics(per_query: &[MetricSet]) -> MetricSet {
    let Some(first) = per_query.first() else {
        return MetricSet::new();
    };
    first
        .keys()
        .map(|name| {
            let sum: f64 = per_query.iter().map(|m| m.get(name).copied().unwrap_or(0.0)).sum();
            let key = match name.as_str() {
                RECIPROCAL_RANK => MRR.to_string(),
                AVERAGE_PRECISION => MAP.to_string(),
                other => other.to_string(),
            };
            (key, sum / per_query.len() as f64)
        })
        .collect()
}
