//! Process-local chunk store with the same semantics as the Postgres table:
//! exact linear scan, Euclidean distance, ties in insertion order.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::vector_store::{check_dimensions, ChunkStore};
use crate::error::Result;
use crate::models::{NewChunk, RetrievedChunk};

#[derive(Debug)]
pub struct InMemoryChunkStore {
    rows: RwLock<Vec<NewChunk>>,
    dimensions: usize,
}

impl InMemoryChunkStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            dimensions,
        }
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_chunk(&self, chunk: &NewChunk) -> Result<bool> {
        check_dimensions(self.dimensions, chunk.embedding.len())?;

        let mut rows = self.rows.write().await;
        if rows.iter().any(|row| row.chunk_id == chunk.chunk_id) {
            return Ok(false);
        }
        rows.push(chunk.clone());
        Ok(true)
    }

    async fn nearest(&self, query: &[f32], top_n: usize) -> Result<Vec<RetrievedChunk>> {
        check_dimensions(self.dimensions, query.len())?;

        let rows = self.rows.read().await;
        let mut scored: Vec<RetrievedChunk> = rows
            .iter()
            .map(|row| RetrievedChunk {
                chunk_id: row.chunk_id,
                document_id: row.document_id.clone(),
                text: row.text.clone(),
                metadata: row.metadata.clone(),
                distance: euclidean_distance(&row.embedding, query),
            })
            .collect();

        // stable sort keeps insertion order among equal distances
        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_n);
        Ok(scored)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.rows.read().await.len() as u64)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
