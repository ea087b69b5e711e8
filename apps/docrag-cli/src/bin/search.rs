use anyhow::Result;
use clap::Parser;

use docrag_cli::{init_tracing, load_config, open_engine};

/// Hybrid search over the ingested corpus.
#[derive(Debug, Parser)]
#[command(name = "docrag-search", version)]
struct Args {
    query: String,
    /// Number of results (defaults to `retrieval.default_k`).
    #[arg(short = 'k', long = "top-k")]
    k: Option<usize>,
    /// Print results as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config()?;
    let k = args.k.unwrap_or(config.retrieval.default_k);

    let engine = open_engine(&config)?;
    let results = engine.search(&args.query, k);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    println!("🔍 Found {} results for: \"{}\"", results.len(), args.query);
    for (i, r) in results.iter().enumerate() {
        println!(
            "\n  {}. score={:.4}  id={}  document={}  section={}  page={}",
            i + 1,
            r.hybrid_score,
            r.chunk_id,
            r.metadata.document_title,
            r.metadata.section,
            r.metadata.page_start
        );
        println!("     📝 {}", r.text);
    }
    Ok(())
}
