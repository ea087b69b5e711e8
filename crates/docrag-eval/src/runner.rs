use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Instant;

use docrag_core::config::{check_unit_interval, EvaluationConfig};
use docrag_core::traits::{AnswerPipeline, Retriever};
use docrag_core::types::{EvaluationItem, MetricSet};

use crate::metrics::{aggregate_metrics, calculate_metrics, MRR, PRECISION_AT_5, RECALL_AT_10};

/// Depth of the retrieval run behind every metric.
pub const RETRIEVAL_K: usize = 10;
const QUICK_ITEMS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub recall: f64,
    pub mrr: f64,
    pub precision: f64,
    /// Share of the composite taken by retrieval; the rest goes to QA.
    pub retrieval_vs_qa: f64,
}

impl ScoreWeights {
    pub fn from_config(config: &EvaluationConfig) -> docrag_core::error::Result<Self> {
        let weights = Self {
            recall: config.recall_weight,
            mrr: config.mrr_weight,
            precision: config.precision_weight,
            retrieval_vs_qa: config.retrieval_vs_qa,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> docrag_core::error::Result<()> {
        check_unit_interval("recall_weight", self.recall)?;
        check_unit_interval("mrr_weight", self.mrr)?;
        check_unit_interval("precision_weight", self.precision)?;
        check_unit_interval("retrieval_vs_qa", self.retrieval_vs_qa)
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { recall: 0.4, mrr: 0.3, precision: 0.3, retrieval_vs_qa: 0.5 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaMetrics {
    pub factual_accuracy: f64,
    /// Seconds.
    pub avg_response_time: f64,
    pub p95_response_time: f64,
    pub correct_answers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub dataset_size: usize,
    pub seed: u64,
    pub retrieval_metrics: MetricSet,
    /// Absent for retrieval-only runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa_metrics: Option<QaMetrics>,
    pub overall_score: f64,
}

/// Summary used by dashboards; computed once over the first few items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickMetrics {
    pub overall_score: f64,
    pub recall_at_10: f64,
    pub factual_accuracy: f64,
    pub avg_response_time: f64,
}

/// Drives a retriever and an answer pipeline over the golden dataset.
/// Queries run one after another so each latency belongs to one query.
pub struct EvaluationRunner<R: Retriever, P: AnswerPipeline> {
    retriever: R,
    pipeline: P,
    dataset: Vec<EvaluationItem>,
    weights: ScoreWeights,
    seed: u64,
    quick: OnceLock<QuickMetrics>,
}

impl<R: Retriever, P: AnswerPipeline> EvaluationRunner<R, P> {
    pub fn new(
        retriever: R,
        pipeline: P,
        dataset: Vec<EvaluationItem>,
        weights: ScoreWeights,
        seed: u64,
    ) -> docrag_core::error::Result<Self> {
        weights.validate()?;
        Ok(Self { retriever, pipeline, dataset, weights, seed, quick: OnceLock::new() })
    }

    /// Weights, seed and optional sub-sampling from the `evaluation` section.
    pub fn from_config(
        retriever: R,
        pipeline: P,
        dataset: Vec<EvaluationItem>,
        config: &EvaluationConfig,
    ) -> docrag_core::error::Result<Self> {
        let weights = ScoreWeights::from_config(config)?;
        let dataset = match config.sample_size {
            Some(size) => sample_items(dataset, size, config.seed),
            None => dataset,
        };
        Self::new(retriever, pipeline, dataset, weights, config.seed)
    }

    pub fn dataset(&self) -> &[EvaluationItem] {
        &self.dataset
    }

    pub fn evaluate_retrieval(&self) -> MetricSet {
        retrieval_metrics(&self.retriever, &self.dataset)
    }

    pub fn evaluate_qa_quality(&self) -> Result<QaMetrics> {
        qa_metrics(&self.pipeline, &self.dataset)
    }

    pub fn run_full_evaluation(&self) -> Result<EvaluationReport> {
        self.report_for(&self.dataset, true)
    }

    /// Retrieval metrics only; the composite counts QA as zero.
    pub fn run_retrieval_evaluation(&self) -> Result<EvaluationReport> {
        self.report_for(&self.dataset, false)
    }

    /// Cached full evaluation over the first three items.
    pub fn quick_metrics(&self) -> Result<QuickMetrics> {
        if let Some(cached) = self.quick.get() {
            return Ok(cached.clone());
        }
        let head = &self.dataset[..self.dataset.len().min(QUICK_ITEMS)];
        let report = self.report_for(head, true)?;
        let qa = report.qa_metrics.unwrap_or_default();
        let quick = QuickMetrics {
            overall_score: report.overall_score,
            recall_at_10: report.retrieval_metrics.get(RECALL_AT_10).copied().unwrap_or(0.0),
            factual_accuracy: qa.factual_accuracy,
            avg_response_time: qa.avg_response_time,
        };
        Ok(self.quick.get_or_init(|| quick).clone())
    }

    pub fn overall_score(&self, retrieval: &MetricSet, qa: Option<&QaMetrics>) -> f64 {
        overall_score(&self.weights, retrieval, qa)
    }

    fn report_for(&self, items: &[EvaluationItem], with_qa: bool) -> Result<EvaluationReport> {
        tracing::info!(items = items.len(), with_qa, seed = self.seed, "running evaluation");
        let retrieval = retrieval_metrics(&self.retriever, items);
        let qa = if with_qa { Some(qa_metrics(&self.pipeline, items)?) } else { None };
        let overall_score = overall_score(&self.weights, &retrieval, qa.as_ref());
        Ok(EvaluationReport {
            dataset_size: items.len(),
            seed: self.seed,
            retrieval_metrics: retrieval,
            qa_metrics: qa,
            overall_score,
        })
    }
}

fn retrieval_metrics<R: Retriever>(retriever: &R, items: &[EvaluationItem]) -> MetricSet {
    let per_query: Vec<MetricSet> = items
        .iter()
        .map(|item| {
            let retrieved: Vec<String> = retriever
                .retrieve(&item.question, RETRIEVAL_K)
                .into_iter()
                .map(|r| r.chunk_id)
                .collect();
            tracing::debug!(id = %item.id, retrieved = retrieved.len(), "retrieval evaluated");
            calculate_metrics(&item.relevant_chunk_ids, &retrieved)
        })
        .collect();
    aggregate_metrics(&per_query)
}

fn qa_metrics<P: AnswerPipeline>(pipeline: &P, items: &[EvaluationItem]) -> Result<QaMetrics> {
    let mut correct = 0usize;
    let mut times = Vec::with_capacity(items.len());
    for item in items {
        let start = Instant::now();
        let answer = pipeline
            .answer(&item.question)
            .with_context(|| format!("answer pipeline failed on item {}", item.id))?;
        times.push(start.elapsed().as_secs_f64());
        if answer_matches(&answer, &item.golden_answer) {
            correct += 1;
        }
    }
    let count = items.len().max(1) as f64;
    Ok(QaMetrics {
        factual_accuracy: correct as f64 / count,
        avg_response_time: times.iter().sum::<f64>() / count,
        p95_response_time: p95(&mut times),
        correct_answers: correct,
    })
}

/// Case-insensitive substring match against any accepted answer.
pub fn answer_matches(answer: &str, accepted: &[String]) -> bool {
    let answer = answer.to_lowercase();
    accepted.iter().any(|a| answer.contains(&a.to_lowercase()))
}

/// Nearest-rank 95th percentile: sorted index `ceil(0.95 n) - 1`.
pub fn p95(times: &mut [f64]) -> f64 {
    if times.is_empty() {
        return 0.0;
    }
    times.sort_by(f64::total_cmp);
    let rank = (0.95 * times.len() as f64).ceil() as usize;
    times[rank.saturating_sub(1).min(times.len() - 1)]
}

/// Composite score on 0..=100, rounded to two decimals.
pub fn overall_score(weights: &ScoreWeights, retrieval: &MetricSet, qa: Option<&QaMetrics>) -> f64 {
    let metric = |name: &str| retrieval.get(name).copied().unwrap_or(0.0);
    let retrieval_score =
        metric(RECALL_AT_10) * weights.recall + metric(MRR) * weights.mrr + metric(PRECISION_AT_5) * weights.precision;
    let qa_score = qa.map_or(0.0, |q| q.factual_accuracy);
    let blended = retrieval_score * weights.retrieval_vs_qa + qa_score * (1.0 - weights.retrieval_vs_qa);
    (blended * 100.0 * 100.0).round() / 100.0
}

/// Seeded subset of `size` items, kept in dataset order.
pub fn sample_items(items: Vec<EvaluationItem>, size: usize, seed: u64) -> Vec<EvaluationItem> {
    if size >= items.len() {
        return items;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let picked = rand::seq::index::sample(&mut rng, items.len(), size).into_vec();
    tracing::info!(from = items.len(), to = size, seed, "sub-sampling golden dataset");
    let mut keep = vec![false; items.len()];
    for i in picked {
        keep[i] = true;
    }
    items.into_iter().zip(keep).filter_map(|(item, k)| k.then_some(item)).collect()
}
