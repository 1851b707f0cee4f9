pub mod api;
pub mod config;
pub mod error;
pub mod indexer;
pub mod models;
pub mod ollama;
pub mod rag;

pub use error::{RagError, Result};
pub use rag::RagEngine;
