#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pdf_rag::rag::embeddings::Embedder;
use pdf_rag::rag::generator::Generator;
use pdf_rag::rag::inmemory::InMemoryChunkStore;
use pdf_rag::{RagEngine, RagError, Result};

pub const VOCABULARY: [&str; 3] = ["cat", "dog", "fish"];
pub const DIMS: usize = VOCABULARY.len() + 1;

/// Counts vocabulary words; the last component is a constant bias so that no
/// embedding is all zeros.
#[derive(Default)]
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
    /// Fail once this many calls have succeeded.
    pub fail_after: Option<usize>,
}

impl KeywordEmbedder {
    pub fn failing_after(n: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_after: Some(n),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let done = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|n| done >= n) {
            return Err(RagError::Embedding {
                model: "keyword".to_string(),
                message: "service unreachable".to_string(),
            });
        }

        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect();
        vector.push(1.0);
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

#[derive(Default)]
pub struct RecordingGenerator {
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("generated answer".to_string())
    }
}

pub struct Harness {
    pub engine: RagEngine,
    pub embedder: Arc<KeywordEmbedder>,
    pub store: Arc<InMemoryChunkStore>,
    pub generator: Arc<RecordingGenerator>,
}

pub fn harness() -> Harness {
    harness_with(KeywordEmbedder::default())
}

pub fn harness_with(embedder: KeywordEmbedder) -> Harness {
    let embedder = Arc::new(embedder);
    let store = Arc::new(InMemoryChunkStore::new(DIMS));
    let generator = Arc::new(RecordingGenerator::default());
    let engine = RagEngine::new(embedder.clone(), store.clone(), generator.clone()).unwrap();
    Harness {
        engine,
        embedder,
        store,
        generator,
    }
}
