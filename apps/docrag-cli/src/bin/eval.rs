use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use docrag_cli::{init_tracing, load_config, open_engine};
use docrag_eval::metrics::RECALL_AT_5;
use docrag_eval::{load_dataset, EvaluationReport, EvaluationRunner};
use docrag_hybrid::ExtractiveAnswerer;

/// Score retrieval and answers against the golden dataset.
#[derive(Debug, Parser)]
#[command(name = "docrag-eval", version)]
struct Args {
    /// Golden dataset JSON (defaults to `data.golden_dataset`).
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Also write the full report as JSON here.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Skip the answer pipeline.
    #[arg(long)]
    retrieval_only: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config()?;

    let dataset_path = args.dataset.unwrap_or_else(|| config.path(&config.data.golden_dataset));
    let dataset = load_dataset(&dataset_path)?;
    let engine = open_engine(&config)?;
    let answerer = ExtractiveAnswerer::new(&engine, config.evaluation.answer_top_n);
    let runner = EvaluationRunner::from_config(&engine, answerer, dataset, &config.evaluation)?;

    let report = if args.retrieval_only {
        runner.run_retrieval_evaluation()?
    } else {
        runner.run_full_evaluation()?
    };
    print_report(&report);

    if let Some(path) = args.output {
        let body = serde_json::to_string_pretty(&report)?;
        fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nReport written to {}", path.display());
    }
    Ok(())
}

fn print_report(report: &EvaluationReport) {
    let qa = report.qa_metrics.clone().unwrap_or_default();
    println!("Seed: {}", report.seed);
    println!("Recall@5: {:.3}", report.retrieval_metrics.get(RECALL_AT_5).copied().unwrap_or(0.0));
    if report.qa_metrics.is_some() {
        println!("Factual match: {:.1}%", qa.factual_accuracy * 100.0);
        println!("P95 latency: {:.3}s", qa.p95_response_time);
    }
    println!("-- Detailed Metrics --");
    println!("Dataset: {} questions", report.dataset_size);
    println!("Overall Score: {}/100", report.overall_score);
    println!("Retrieval Metrics:");
    for (name, value) in &report.retrieval_metrics {
        println!("  {name}: {value:.3}");
    }
    if report.qa_metrics.is_some() {
        println!("QA Metrics:");
        println!("  factual_accuracy: {:.3}", qa.factual_accuracy);
        println!("  avg_response_time: {:.3}", qa.avg_response_time);
        println!("  p95_response_time: {:.3}", qa.p95_response_time);
        println!("  correct_answers: {}", qa.correct_answers);
    }
}
