use config::{Config, Environment};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

use crate::error::{RagError, Result};
use crate::rag::vector_store::is_valid_table_name;
use crate::rag::MAX_TOP_N;

/// Where chunk records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Process-wide settings, read from the environment (and `.env`) at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Full connection URL. When set, the `db_*` parts are ignored.
    pub database_url: Option<String>,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_pass: String,
    pub db_max_connections: u32,

    pub ollama_url: String,
    pub embed_model: String,
    pub llm_model: String,

    /// Dimension of the `embedding` column; every stored vector has this length.
    pub table_dim: usize,
    pub chunk_table: String,
    pub chunk_max_chars: Option<usize>,
    pub default_top_n: usize,

    pub store_backend: StoreBackend,
    pub bind_addr: String,
}

impl Settings {
    /// Load `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let source = Config::builder()
            .add_source(Environment::default().try_parsing(true))
            .build()?;
        Self::from_config(source)
    }

    /// Build from an already assembled [`Config`]. Missing keys fall back to defaults.
    pub fn from_config(source: Config) -> Result<Self> {
        let merged = Self::defaults()?.add_source(source).build()?;
        let settings: Settings = merged.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            .set_default("db_host", "localhost")?
            .set_default("db_port", 5432)?
            .set_default("db_name", "postgres")?
            .set_default("db_user", "postgres")?
            .set_default("db_pass", "")?
            .set_default("db_max_connections", 5)?
            .set_default("ollama_url", "http://localhost:11434")?
            .set_default("embed_model", "nomic-embed-text")?
            .set_default("llm_model", "llama3")?
            .set_default("table_dim", 768)?
            .set_default("chunk_table", "document_chunks")?
            .set_default("default_top_n", 5)?
            .set_default("store_backend", "postgres")?
            .set_default("bind_addr", "0.0.0.0:8080")?)
    }

    fn validate(&self) -> Result<()> {
        if self.table_dim == 0 {
            return Err(RagError::Config("TABLE_DIM must be positive".to_string()));
        }
        if !is_valid_table_name(&self.chunk_table) {
            return Err(RagError::Config(format!(
                "CHUNK_TABLE must match [A-Za-z0-9_]+, got {:?}",
                self.chunk_table
            )));
        }
        if self.default_top_n == 0 || self.default_top_n > MAX_TOP_N {
            return Err(RagError::Config(format!(
                "DEFAULT_TOP_N must be within 1..={}",
                MAX_TOP_N
            )));
        }
        if self.chunk_max_chars == Some(0) {
            return Err(RagError::Config("CHUNK_MAX_CHARS must be positive".to_string()));
        }
        Ok(())
    }

    pub fn pg_connect_options(&self) -> Result<PgConnectOptions> {
        if let Some(ref url) = self.database_url {
            return url
                .parse::<PgConnectOptions>()
                .map_err(|e| RagError::Config(format!("Invalid DATABASE_URL: {}", e)));
        }
        Ok(PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .database(&self.db_name)
            .username(&self.db_user)
            .password(&self.db_pass))
    }

    /// Connection target without the password, for logs.
    pub fn db_display(&self) -> String {
        match self.database_url {
            Some(_) => "DATABASE_URL".to_string(),
            None => format!("{}@{}:{}/{}", self.db_user, self.db_host, self.db_port, self.db_name),
        }
    }
}
