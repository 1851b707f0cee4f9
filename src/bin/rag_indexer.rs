use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pdf_rag::config::Settings;
use pdf_rag::indexer::walker::{walk_directory, SupportedFormat};
use pdf_rag::RagEngine;

#[derive(Parser, Debug)]
#[command(name = "rag-indexer")]
#[command(about = "Extract, chunk, embed and store documents in the chunk table")]
struct Args {
    /// Document to ingest, or a directory to walk recursively
    #[arg(short, long)]
    path: PathBuf,

    /// Document id for a single file (defaults to the file name)
    #[arg(long)]
    document_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::from_env().context("Failed to load settings")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    if !args.path.exists() {
        anyhow::bail!("Path does not exist: {}", args.path.display());
    }

    println!("Connecting to chunk store ({})...", settings.db_display());
    let engine = RagEngine::from_settings(&settings).await?;

    if args.path.is_file() {
        if SupportedFormat::from_path(&args.path).is_none() {
            anyhow::bail!("Unsupported document type: {}", args.path.display());
        }
        let report = match args.document_id {
            Some(ref id) => engine.ingest_file_as(&args.path, id).await?,
            None => engine.ingest_file(&args.path).await?,
        };

        println!("Stored {} paragraphs from {}", report.chunks_stored, report.document_id);
        println!("  Pages:             {}", report.pages);
        println!("  Paragraphs stored: {}", report.chunks_stored);
        println!("\nPreview (first 500 characters):\n{}", report.preview);
        return Ok(());
    }

    if args.document_id.is_some() {
        anyhow::bail!("--document-id only applies to a single file");
    }

    println!("Scanning directory: {}", args.path.display());
    let files = walk_directory(&args.path);
    println!("Found {} supported files", files.len());

    if files.is_empty() {
        println!("No supported files found. Exiting.");
        return Ok(());
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut success_count = 0usize;
    let mut total_chunks = 0usize;
    let mut failed_files: Vec<(PathBuf, String)> = Vec::new();

    for (path, _) in &files {
        pb.set_message(format!("{}", path.file_name().unwrap_or_default().to_string_lossy()));

        match engine.ingest_file(path).await {
            Ok(report) => {
                success_count += 1;
                total_chunks += report.chunks_stored;
            }
            Err(e) => {
                tracing::warn!("Failed to ingest {}: {}", path.display(), e);
                failed_files.push((path.clone(), e.to_string()));
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("done");

    println!("\nIndexing complete!");
    println!("  Files processed: {}/{}", success_count, files.len());
    println!("  Files failed:    {}", failed_files.len());
    println!("  Total chunks:    {}", total_chunks);
    println!("  Table:           {}", settings.chunk_table);

    if !failed_files.is_empty() {
        println!("\nFailed files:");
        for (path, err) in &failed_files {
            println!("  {}: {}", path.display(), err);
        }
    }

    Ok(())
}
