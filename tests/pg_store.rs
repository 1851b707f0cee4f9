//! Runs against a real Postgres with pgvector:
//! `TEST_DATABASE_URL=postgres://... cargo test --test pg_store -- --ignored`.
//! Each test uses its own table and drops it afterwards.

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use pdf_rag::models::{ChunkMetadata, NewChunk};
use pdf_rag::rag::vector_store::{ChunkStore, PgChunkStore};

async fn test_store(dims: usize) -> PgChunkStore {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");
    let table = format!("chunks_test_{}", Uuid::new_v4().simple());
    let store = PgChunkStore::from_pool(pool, &table, dims).unwrap();
    store.ensure_schema().await.unwrap();
    store
}

async fn drop_table(store: &PgChunkStore) {
    let sql = format!("DROP TABLE IF EXISTS {}", store.table());
    sqlx::query(&sql).execute(store.pool()).await.unwrap();
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL with pgvector"]
async fn test_schema_creation_is_idempotent() {
    let store = test_store(3).await;
    store.ensure_schema().await.unwrap();
    store.ensure_schema().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
    drop_table(&store).await;
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL with pgvector"]
async fn test_duplicate_chunk_id_is_ignored() {
    let store = test_store(3).await;

    let chunk = NewChunk::new("doc.pdf", "text", ChunkMetadata::new(0), vec![1.0, 2.0, 3.0]);
    assert!(store.insert_chunk(&chunk).await.unwrap());
    assert!(!store.insert_chunk(&chunk).await.unwrap());
    assert_eq!(store.count().await.unwrap(), 1);
    drop_table(&store).await;
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL with pgvector"]
async fn test_round_trip_and_ordering() {
    let store = test_store(2).await;

    let far = store
        .insert("doc.pdf", "far", ChunkMetadata::new(0), vec![10.0, 0.0])
        .await
        .unwrap();
    let near = store
        .insert("doc.pdf", "near", ChunkMetadata::new(1), vec![1.0, 0.0])
        .await
        .unwrap();
    store
        .insert("doc.pdf", "middle", ChunkMetadata::new(2), vec![0.0, 4.0])
        .await
        .unwrap();

    let results = store.nearest(&[0.0, 0.0], 5).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].chunk_id, near);
    assert_eq!(results[0].text, "near");
    assert_eq!(results[0].metadata, ChunkMetadata::new(1));
    assert_eq!(results[2].chunk_id, far);
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert!((results[0].distance - 1.0).abs() < 1e-6);

    assert_eq!(store.nearest(&[0.0, 0.0], 1).await.unwrap().len(), 1);
    drop_table(&store).await;
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL with pgvector"]
async fn test_wrong_dimension_rejected_before_write() {
    let store = test_store(3).await;
    assert!(store
        .insert("doc.pdf", "t", ChunkMetadata::new(0), vec![1.0])
        .await
        .is_err());
    assert_eq!(store.count().await.unwrap(), 0);
    drop_table(&store).await;
}
