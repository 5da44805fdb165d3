//! Vector store and embedding traits

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{EmbeddedChunk, Error, Result, SearchResult};

/// Similarity metric of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
}

/// Configuration of the named collection backing a vector store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: "documents".to_string(),
            dimension: 768,
            metric: Metric::Cosine,
        }
    }
}

impl CollectionConfig {
    /// Reject vectors whose width differs from the collection dimension
    pub fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::InvalidConfiguration(format!(
                "vector of width {} does not fit collection '{}' of dimension {}",
                vector.len(),
                self.name,
                self.dimension
            )));
        }
        Ok(())
    }
}

/// Trait for embedding providers
///
/// Maps text to a fixed-width vector. Implementations must return vectors of
/// exactly [`EmbeddingProvider::dimension`] components.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Width of the vectors this provider produces
    fn dimension(&self) -> usize;
}

/// Trait for vector stores (e.g., Qdrant)
///
/// A store owns one named collection. Batches are persisted as a unit: an
/// upsert either stores every chunk or reports failure for the whole batch.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Ensure the collection exists with the configured dimension and metric.
    /// Calling this more than once is a no-op.
    async fn initialize(&self) -> Result<()>;

    /// Persist a batch of chunks from one source, assigning each a fresh id
    async fn upsert(&self, source: &str, chunks: Vec<EmbeddedChunk>) -> Result<Vec<String>>;

    /// Up to `top_k` nearest records, ordered by descending score
    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// Number of stored records
    async fn count(&self) -> Result<usize>;

    /// Collection this store writes to
    fn collection(&self) -> &CollectionConfig;
}

/// Fail when an embedding provider and a collection disagree on vector width.
///
/// The declared width is compared first, then one sample text is embedded so
/// a model whose real output differs from its configuration is caught before
/// anything is stored.
pub async fn ensure_compatible(
    embedder: &dyn EmbeddingProvider,
    collection: &CollectionConfig,
) -> Result<()> {
    if embedder.dimension() != collection.dimension {
        return Err(Error::InvalidConfiguration(format!(
            "embedding width {} does not match collection '{}' dimension {}",
            embedder.dimension(),
            collection.name,
            collection.dimension
        )));
    }

    let sample = embedder.embed("dimension check").await?;
    collection.check_vector(&sample)
}
