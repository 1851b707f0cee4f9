use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pdf_rag::config::Settings;
use pdf_rag::rag::MAX_TOP_N;
use pdf_rag::RagEngine;

#[derive(Parser, Debug)]
#[command(name = "rag-ask")]
#[command(about = "Answer a question from the stored document chunks")]
struct Args {
    /// Question to answer
    question: String,

    /// Number of chunks to retrieve as context (1-10)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=MAX_TOP_N as i64))]
    top_n: Option<u8>,

    /// Also print the retrieved chunks and their distances
    #[arg(long, default_value_t = false)]
    show_sources: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::from_env().context("Failed to load settings")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let engine = RagEngine::from_settings(&settings).await?;
    let top_n = args.top_n.map(usize::from).unwrap_or(settings.default_top_n);

    let answer = engine.answer(&args.question, top_n).await?;
    println!("{}", answer.text);

    if args.show_sources && !answer.sources.is_empty() {
        println!("\nSources:");
        for (rank, chunk) in answer.sources.iter().enumerate() {
            println!(
                "  {}. {} #{} (distance {:.4})",
                rank + 1,
                chunk.document_id,
                chunk.metadata.chunk_index,
                chunk.distance
            );
        }
    }

    Ok(())
}
