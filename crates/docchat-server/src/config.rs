//! Application configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use docchat_core::{CollectionConfig, Error, Metric, Result};
use docchat_ollama::OllamaConfig;
use docchat_rag::{ChunkerConfig, DEFAULT_TOP_K};

/// Which vector store backs the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Qdrant,
    Memory,
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(StoreKind::Qdrant),
            "memory" => Ok(StoreKind::Memory),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown vector store '{other}', expected 'qdrant' or 'memory'"
            ))),
        }
    }
}

/// Which embedding provider turns text into vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingsKind {
    Ollama,
    Hash,
}

impl FromStr for EmbeddingsKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(EmbeddingsKind::Ollama),
            "hash" => Ok(EmbeddingsKind::Hash),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown embeddings provider '{other}', expected 'ollama' or 'hash'"
            ))),
        }
    }
}

/// Configuration for the whole service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    pub documents_path: PathBuf,
    pub qdrant_url: String,
    pub collection_name: String,
    pub finetune_service_url: String,
    pub training_timeout_secs: u64,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub vector_store: StoreKind,
    pub embeddings: EmbeddingsKind,
    pub ollama: OllamaConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let chunker = ChunkerConfig::default();
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            documents_path: PathBuf::from("/app/documents"),
            qdrant_url: "http://qdrant:6334".to_string(),
            collection_name: "documents".to_string(),
            finetune_service_url: "http://finetune-service:8090".to_string(),
            training_timeout_secs: 600,
            chunk_size: chunker.chunk_size,
            chunk_overlap: chunker.overlap,
            top_k: DEFAULT_TOP_K,
            vector_store: StoreKind::Qdrant,
            embeddings: EmbeddingsKind::Ollama,
            ollama: OllamaConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            documents_path: env::var("DOCUMENTS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.documents_path),
            qdrant_url: env::var("QDRANT_URL").unwrap_or(defaults.qdrant_url),
            collection_name: env::var("COLLECTION_NAME").unwrap_or(defaults.collection_name),
            finetune_service_url: env::var("FINETUNE_SERVICE_URL")
                .unwrap_or(defaults.finetune_service_url),
            training_timeout_secs: parse_var(
                "TRAINING_TIMEOUT_SECS",
                defaults.training_timeout_secs,
            )?,
            chunk_size: parse_var("CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: parse_var("CHUNK_OVERLAP", defaults.chunk_overlap)?,
            top_k: parse_var("RETRIEVAL_TOP_K", defaults.top_k)?,
            vector_store: parse_var("VECTOR_STORE", defaults.vector_store)?,
            embeddings: parse_var("EMBEDDINGS", defaults.embeddings)?,
            ollama: OllamaConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.ollama.validate()?;
        docchat_rag::Chunker::new(self.chunker())?;
        if self.top_k == 0 {
            return Err(Error::InvalidConfiguration(
                "RETRIEVAL_TOP_K must be positive".to_string(),
            ));
        }
        url::Url::parse(&self.finetune_service_url).map_err(|e| {
            Error::InvalidConfiguration(format!(
                "invalid FINETUNE_SERVICE_URL '{}': {}",
                self.finetune_service_url, e
            ))
        })?;
        Ok(())
    }

    pub fn chunker(&self) -> ChunkerConfig {
        ChunkerConfig {
            chunk_size: self.chunk_size,
            overlap: self.chunk_overlap,
        }
    }

    pub fn collection(&self) -> CollectionConfig {
        CollectionConfig {
            name: self.collection_name.clone(),
            dimension: self.ollama.embedding_dimension,
            metric: Metric::Cosine,
        }
    }

    pub fn training_timeout(&self) -> Duration {
        Duration::from_secs(self.training_timeout_secs)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            Error::InvalidConfiguration(format!("{name} has an invalid value: '{raw}'"))
        }),
        Err(_) => Ok(default),
    }
}
