use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const METADATA_VERSION: u32 = 1;

fn default_metadata_version() -> u32 {
    METADATA_VERSION
}

/// Auxiliary attributes stored with each chunk as JSONB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default = "default_metadata_version")]
    pub version: u32,
    /// Ordinal position of the chunk within its document.
    pub chunk_index: usize,
}

impl ChunkMetadata {
    pub fn new(chunk_index: usize) -> Self {
        Self {
            version: METADATA_VERSION,
            chunk_index,
        }
    }
}

/// A record ready to be written to the chunk store.
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub chunk_id: Uuid,
    pub document_id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

impl NewChunk {
    /// Assigns a fresh random identifier.
    pub fn new(
        document_id: impl Into<String>,
        text: impl Into<String>,
        metadata: ChunkMetadata,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            chunk_id: Uuid::new_v4(),
            document_id: document_id.into(),
            text: text.into(),
            metadata,
            embedding,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: Uuid,
    pub document_id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Euclidean distance to the query embedding.
    pub distance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<RetrievedChunk>,
}

/// Summary of one ingested document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: String,
    pub pages: usize,
    pub chunks_stored: usize,
    pub preview: String,
}

// HTTP request/response bodies

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub document_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStored {
    pub document_id: String,
    pub chunks_stored: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
    #[serde(default)]
    pub top_n: Option<usize>,
}
