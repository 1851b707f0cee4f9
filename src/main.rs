use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use pdf_rag::api::{router, AppState};
use pdf_rag::config::Settings;
use pdf_rag::ollama::OllamaClient;
use pdf_rag::RagEngine;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env().context("Failed to load settings")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Connecting to Ollama: {}", settings.ollama_url);
    tracing::info!(
        embed_model = %settings.embed_model,
        llm_model = %settings.llm_model,
        table_dim = settings.table_dim,
        "Model configuration"
    );

    let engine = RagEngine::from_settings(&settings)
        .await
        .context("Failed to initialize RAG engine")?;

    let state = Arc::new(AppState {
        engine,
        ollama: OllamaClient::new(&settings.ollama_url),
        default_top_n: settings.default_top_n,
    });

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_addr))?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
