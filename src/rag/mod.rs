pub mod embeddings;
pub mod generator;
pub mod inmemory;
pub mod vector_store;

use std::path::Path;
use std::sync::Arc;

use crate::config::{Settings, StoreBackend};
use crate::error::{RagError, Result};
use crate::indexer::chunker::chunk_paragraphs;
use crate::indexer::extractor::{extract_text, ExtractedDocument};
use crate::indexer::walker::SupportedFormat;
use crate::models::{Answer, ChunkMetadata, IngestReport, RetrievedChunk};
use crate::ollama::OllamaClient;
use self::embeddings::{Embedder, OllamaEmbedder};
use self::generator::{Generator, OllamaGenerator};
use self::inmemory::InMemoryChunkStore;
use self::vector_store::{ChunkStore, PgChunkStore};

pub const DEFAULT_TOP_N: usize = 5;
pub const MAX_TOP_N: usize = 10;

/// Returned when retrieval finds nothing; the model is not consulted.
pub const NO_CONTEXT_ANSWER: &str = "No context found for that question.";

const PREVIEW_CHARS: usize = 500;

/// Ingestion and question answering over a chunk store.
pub struct RagEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn ChunkStore>,
    generator: Arc<dyn Generator>,
    chunk_max_chars: Option<usize>,
}

impl RagEngine {
    /// Fails when the embedder and the store disagree on vector length.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn ChunkStore>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        if embedder.dimensions() != store.dimensions() {
            return Err(RagError::Config(format!(
                "Embedder produces {}-dimensional vectors but the chunk store holds {}",
                embedder.dimensions(),
                store.dimensions()
            )));
        }
        Ok(Self {
            embedder,
            store,
            generator,
            chunk_max_chars: None,
        })
    }

    pub fn with_chunk_max_chars(mut self, max_chars: Option<usize>) -> Self {
        self.chunk_max_chars = max_chars;
        self
    }

    /// Wire up Ollama and the configured store, creating the schema if needed.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let ollama = OllamaClient::new(&settings.ollama_url);
        let embedder = OllamaEmbedder::new(ollama.clone(), &settings.embed_model, settings.table_dim);
        let generator = OllamaGenerator::new(ollama, &settings.llm_model);

        let store: Arc<dyn ChunkStore> = match settings.store_backend {
            StoreBackend::Postgres => {
                tracing::info!("Connecting to database: {}", settings.db_display());
                Arc::new(
                    PgChunkStore::connect(
                        settings.pg_connect_options()?,
                        settings.db_max_connections,
                        &settings.chunk_table,
                        settings.table_dim,
                    )
                    .await?,
                )
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory chunk store; nothing will be persisted");
                Arc::new(InMemoryChunkStore::new(settings.table_dim))
            }
        };
        store.ensure_schema().await?;

        Ok(Self::new(Arc::new(embedder), store, Arc::new(generator))?
            .with_chunk_max_chars(settings.chunk_max_chars))
    }

    pub fn store(&self) -> &Arc<dyn ChunkStore> {
        &self.store
    }

    /// Split `raw_text` into paragraphs, embed each and store it.
    /// Returns the number of chunks stored. A failure part way through leaves
    /// the earlier chunks in place.
    pub async fn insert_document(&self, document_id: &str, raw_text: &str) -> Result<usize> {
        if document_id.trim().is_empty() {
            return Err(RagError::InvalidInput("document_id must not be empty".to_string()));
        }

        let paragraphs = chunk_paragraphs(raw_text, self.chunk_max_chars);
        for (index, paragraph) in paragraphs.iter().enumerate() {
            let embedding = self.embedder.embed(paragraph).await?;
            self.store
                .insert(document_id, paragraph, ChunkMetadata::new(index), embedding)
                .await?;
        }

        tracing::info!(document_id, chunks = paragraphs.len(), "document stored");
        Ok(paragraphs.len())
    }

    /// Extract and store a file under its file name.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        let document_id = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| RagError::InvalidInput(format!("Not a file path: {}", path.display())))?;
        self.ingest_file_as(path, &document_id).await
    }

    pub async fn ingest_file_as(&self, path: &Path, document_id: &str) -> Result<IngestReport> {
        let format = SupportedFormat::from_path(path).ok_or_else(|| {
            RagError::InvalidInput(format!("Unsupported document type: {}", path.display()))
        })?;

        let owned = path.to_path_buf();
        let extracted: ExtractedDocument =
            tokio::task::spawn_blocking(move || extract_text(&owned, format))
                .await
                .map_err(|e| RagError::Extraction {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })??;

        let chunks_stored = self.insert_document(document_id, &extracted.text).await?;

        Ok(IngestReport {
            document_id: document_id.to_string(),
            pages: extracted.pages,
            chunks_stored,
            preview: extracted.text.chars().take(PREVIEW_CHARS).collect(),
        })
    }

    pub async fn retrieve(&self, query: &str, top_n: usize) -> Result<Vec<RetrievedChunk>> {
        if top_n == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedder.embed(query).await?;
        self.store.nearest(&query_embedding, top_n).await
    }

    /// Answer `question` from the `top_n` closest chunks.
    pub async fn answer(&self, question: &str, top_n: usize) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(RagError::InvalidInput("question must not be empty".to_string()));
        }

        let sources = self.retrieve(question, top_n).await?;
        if sources.is_empty() {
            tracing::info!(top_n, "no context retrieved");
            return Ok(Answer {
                text: NO_CONTEXT_ANSWER.to_string(),
                sources,
            });
        }

        let prompt = build_prompt(&build_context(&sources), question);
        let text = self.generator.generate(&prompt).await?;
        tracing::info!(top_n, sources = sources.len(), "answer generated");

        Ok(Answer { text, sources })
    }

    pub async fn ask(&self, question: &str, top_n: usize) -> Result<String> {
        Ok(self.answer(question, top_n).await?.text)
    }
}

/// Chunk texts in retrieval order, separated by blank lines.
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant. Answer the question using ONLY the context below.\n\n\
         CONTEXT:\n{}\n\n\
         QUESTION: {}\n\n\
         Answer:",
        context, question
    )
}
