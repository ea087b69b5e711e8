use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use docrag_cli::{build_chunker, init_tracing, load_config, open_lexical, open_semantic};
use docrag_core::data_processor::DataProcessor;
use docrag_core::traits::{LexicalIndex, SemanticIndex};

/// Chunk parsed documents and (re)build both search indexes.
#[derive(Debug, Parser)]
#[command(name = "docrag-ingest", version)]
struct Args {
    /// Directory of parsed-document JSON files (defaults to `data.raw_docs_dir`).
    raw_dir: Option<PathBuf>,
    /// Only ingest the first N documents.
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    skip_lexical: bool,
    #[arg(long)]
    skip_semantic: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config()?;

    let raw_dir = args.raw_dir.unwrap_or_else(|| config.path(&config.data.raw_docs_dir));
    let processed_dir = config.path(&config.data.processed_dir);
    println!("docrag ingest\n=============");
    println!("Parsed documents: {}", raw_dir.display());
    println!("Processed records: {}", processed_dir.display());

    // ids restart at chunk_0 every run, so old records are replaced, never merged
    let processor = DataProcessor::new(build_chunker(&config)?, &processed_dir);
    let report = processor.rebuild(&raw_dir, args.limit)?;
    println!(
        "📊 {} documents chunked into {} chunks ({} skipped)",
        report.documents_processed, report.total_chunks, report.documents_failed
    );

    if args.skip_lexical {
        println!("⚠️  Skipping lexical index (--skip-lexical)");
    } else {
        open_lexical(&config)?.build(&report.chunks)?;
        println!("📊 Lexical index: {} chunks", report.chunks.len());
    }

    if args.skip_semantic {
        println!("⚠️  Skipping semantic index (--skip-semantic)");
    } else {
        let semantic = open_semantic(&config)?;
        semantic.clear()?;
        semantic.add(&report.chunks)?;
        println!("📊 Semantic index: {} chunks", semantic.count()?);
    }

    println!("\n✅ Ingest complete");
    Ok(())
}
