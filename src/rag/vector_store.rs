use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{RagError, Result};
use crate::models::{ChunkMetadata, NewChunk, RetrievedChunk};

/// Persistent chunk records with exact nearest-neighbour lookup.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Create the backing schema if it does not exist yet.
    async fn ensure_schema(&self) -> Result<()>;

    /// Write one record. Returns `false` when the id already exists, in which
    /// case nothing is written.
    async fn insert_chunk(&self, chunk: &NewChunk) -> Result<bool>;

    /// Up to `top_n` chunks ordered by ascending Euclidean distance to
    /// `query`; equal distances keep storage order.
    async fn nearest(&self, query: &[f32], top_n: usize) -> Result<Vec<RetrievedChunk>>;

    async fn count(&self) -> Result<u64>;

    fn dimensions(&self) -> usize;

    /// Store a chunk under a freshly generated id.
    async fn insert(
        &self,
        document_id: &str,
        text: &str,
        metadata: ChunkMetadata,
        embedding: Vec<f32>,
    ) -> Result<Uuid> {
        let chunk = NewChunk::new(document_id, text, metadata, embedding);
        if !self.insert_chunk(&chunk).await? {
            tracing::warn!(chunk_id = %chunk.chunk_id, "chunk id collision, insert skipped");
        }
        Ok(chunk.chunk_id)
    }
}

pub(crate) fn check_dimensions(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(RagError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// pgvector text literal, e.g. `[0.5,1,-2]`.
fn vector_literal(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

/// Chunk table in PostgreSQL with the pgvector extension.
pub struct PgChunkStore {
    pool: PgPool,
    table: String,
    dimensions: usize,
}

impl PgChunkStore {
    pub async fn connect(
        options: PgConnectOptions,
        max_connections: u32,
        table: &str,
        dimensions: usize,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Self::from_pool(pool, table, dimensions)
    }

    pub fn from_pool(pool: PgPool, table: &str, dimensions: usize) -> Result<Self> {
        if !is_valid_table_name(table) {
            return Err(RagError::Config(format!("Invalid chunk table name: {:?}", table)));
        }
        if dimensions == 0 {
            return Err(RagError::Config("Vector dimension must be positive".to_string()));
        }
        Ok(Self {
            pool,
            table: table.to_string(),
            dimensions,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn row_to_chunk(row: &PgRow) -> Result<RetrievedChunk> {
        let metadata: serde_json::Value = row.try_get("metadata")?;
        Ok(RetrievedChunk {
            chunk_id: row.try_get("chunk_id")?,
            document_id: row.try_get("document_id")?,
            text: row.try_get("text")?,
            metadata: serde_json::from_value(metadata)?,
            distance: row.try_get("distance")?,
        })
    }
}

#[async_trait]
impl ChunkStore for PgChunkStore {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        let create_sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                chunk_id    UUID PRIMARY KEY,
                document_id TEXT NOT NULL,
                text        TEXT NOT NULL,
                metadata    JSONB NOT NULL,
                embedding   VECTOR({dims}) NOT NULL,
                seq         BIGSERIAL NOT NULL
            )
            "#,
            table = self.table,
            dims = self.dimensions,
        );
        sqlx::query(&create_sql).execute(&self.pool).await?;

        let index_sql = format!(
            "CREATE INDEX IF NOT EXISTS {table}_document_id_idx ON {table}(document_id)",
            table = self.table,
        );
        sqlx::query(&index_sql).execute(&self.pool).await?;

        tracing::info!(table = %self.table, dimensions = self.dimensions, "chunk table ready");
        Ok(())
    }

    async fn insert_chunk(&self, chunk: &NewChunk) -> Result<bool> {
        check_dimensions(self.dimensions, chunk.embedding.len())?;

        let sql = format!(
            r#"
            INSERT INTO {} (chunk_id, document_id, text, metadata, embedding)
            VALUES ($1, $2, $3, $4, $5::vector)
            ON CONFLICT (chunk_id) DO NOTHING
            "#,
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(chunk.chunk_id)
            .bind(&chunk.document_id)
            .bind(&chunk.text)
            .bind(serde_json::to_value(&chunk.metadata)?)
            .bind(vector_literal(&chunk.embedding))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn nearest(&self, query: &[f32], top_n: usize) -> Result<Vec<RetrievedChunk>> {
        check_dimensions(self.dimensions, query.len())?;
        if top_n == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT chunk_id, document_id, text, metadata,
                   embedding <-> $1::vector AS distance
            FROM {}
            ORDER BY distance, seq
            LIMIT $2
            "#,
            self.table
        );
        let limit = i64::try_from(top_n).unwrap_or(i64::MAX);
        let rows = sqlx::query(&sql)
            .bind(vector_literal(query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_chunk).collect()
    }

    async fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
