//! Vector store implementations

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfig;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use docchat_core::{
    Chunk, CollectionConfig, EmbeddedChunk, Error, Result, SearchResult, VectorStore,
};

/// Cosine similarity; zero when either vector has no magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

fn check_batch(collection: &CollectionConfig, chunks: &[EmbeddedChunk]) -> Result<()> {
    for chunk in chunks {
        collection.check_vector(&chunk.vector)?;
        if chunk.content.trim().is_empty() {
            return Err(Error::InvalidInput("chunk content must not be empty".to_string()));
        }
    }
    Ok(())
}

/// Local in-memory vector store implementation
///
/// Records are kept in insertion order, which also breaks score ties.
pub struct MemoryVectorStore {
    collection: CollectionConfig,
    records: RwLock<Vec<Chunk>>,
    initialized: AtomicBool,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store
    pub fn new(collection: CollectionConfig) -> Self {
        Self {
            collection,
            records: RwLock::new(Vec::new()),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Snapshot of every stored record
    pub fn records(&self) -> Result<Vec<Chunk>> {
        let records = self
            .records
            .read()
            .map_err(|e| Error::Other(format!("Lock error: {}", e)))?;
        Ok(records.clone())
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn initialize(&self) -> Result<()> {
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    async fn upsert(&self, source: &str, chunks: Vec<EmbeddedChunk>) -> Result<Vec<String>> {
        check_batch(&self.collection, &chunks)?;

        let mut records = self
            .records
            .write()
            .map_err(|e| Error::Other(format!("Lock error: {}", e)))?;

        let mut ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let id = Uuid::new_v4().to_string();
            records.push(Chunk {
                id: id.clone(),
                content: chunk.content,
                source: source.to_string(),
                vector: chunk.vector,
            });
            ids.push(id);
        }

        Ok(ids)
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        self.collection.check_vector(vector)?;

        let records = self
            .records
            .read()
            .map_err(|e| Error::Other(format!("Lock error: {}", e)))?;

        let mut scored: Vec<(usize, f32)> = records
            .iter()
            .enumerate()
            .map(|(i, record)| (i, cosine_similarity(vector, &record.vector)))
            .collect();

        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult {
                content: records[i].content.clone(),
                source: records[i].source.clone(),
                score,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        let records = self
            .records
            .read()
            .map_err(|e| Error::Other(format!("Lock error: {}", e)))?;
        Ok(records.len())
    }

    fn collection(&self) -> &CollectionConfig {
        &self.collection
    }
}

/// Qdrant vector store implementation
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: CollectionConfig,
}

fn qdrant_error(err: qdrant_client::QdrantError) -> Error {
    Error::Upstream(format!("Qdrant: {err}"))
}

/// String payload field of a stored point
fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    match payload.get(key) {
        Some(Value {
            kind: Some(Kind::StringValue(s)),
        }) => Some(s.clone()),
        _ => None,
    }
}

fn point_payload(content: String, source: &str, ingested_at: &str) -> HashMap<String, Value> {
    let mut payload = HashMap::new();
    payload.insert("content".to_string(), Value::from(content));
    payload.insert("source".to_string(), Value::from(source.to_string()));
    payload.insert("ingested_at".to_string(), Value::from(ingested_at.to_string()));
    payload
}

impl QdrantVectorStore {
    /// Connect to Qdrant at `url` (gRPC endpoint, e.g. `http://qdrant:6334`)
    pub fn new(url: &str, collection: CollectionConfig) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(|e| {
            Error::InvalidConfiguration(format!("invalid Qdrant URL '{url}': {e}"))
        })?;
        Ok(Self { client, collection })
    }

    /// Vector size and distance of the existing collection
    async fn existing_params(&self) -> Result<(u64, i32)> {
        let info = self
            .client
            .collection_info(self.collection.name.as_str())
            .await
            .map_err(qdrant_error)?;

        info.result
            .and_then(|info| info.config)
            .and_then(|config| config.params)
            .and_then(|params| params.vectors_config)
            .and_then(|vectors| vectors.config)
            .and_then(|config| match config {
                VectorsConfig::Params(params) => Some((params.size, params.distance)),
                VectorsConfig::ParamsMap(_) => None,
            })
            .ok_or_else(|| {
                Error::InvalidConfiguration(format!(
                    "collection '{}' does not use a single unnamed vector",
                    self.collection.name
                ))
            })
    }

    async fn verify_existing(&self) -> Result<()> {
        let (size, distance) = self.existing_params().await?;
        if size != self.collection.dimension as u64 {
            return Err(Error::InvalidConfiguration(format!(
                "collection '{}' has dimension {}, configured dimension is {}",
                self.collection.name, size, self.collection.dimension
            )));
        }
        if distance != Distance::Cosine as i32 {
            return Err(Error::InvalidConfiguration(format!(
                "collection '{}' does not use cosine distance",
                self.collection.name
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn initialize(&self) -> Result<()> {
        let name = &self.collection.name;
        let exists = self
            .client
            .collection_exists(name.as_str())
            .await
            .map_err(qdrant_error)?;

        if exists {
            return self.verify_existing().await;
        }

        let create = CreateCollectionBuilder::new(name.clone()).vectors_config(
            VectorParamsBuilder::new(self.collection.dimension as u64, Distance::Cosine),
        );

        match self.client.create_collection(create).await {
            Ok(_) => {
                tracing::info!(collection = %name, dimension = self.collection.dimension, "created Qdrant collection");
                Ok(())
            }
            // another instance may have created it in the meantime
            Err(e) => match self.client.collection_exists(name.as_str()).await {
                Ok(true) => self.verify_existing().await,
                _ => Err(qdrant_error(e)),
            },
        }
    }

    async fn upsert(&self, source: &str, chunks: Vec<EmbeddedChunk>) -> Result<Vec<String>> {
        check_batch(&self.collection, &chunks)?;
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let ingested_at = chrono::Utc::now().to_rfc3339();
        let mut ids = Vec::with_capacity(chunks.len());
        let points: Vec<PointStruct> = chunks
            .into_iter()
            .map(|chunk| {
                let id = Uuid::new_v4().to_string();
                ids.push(id.clone());
                PointStruct::new(
                    id,
                    chunk.vector,
                    point_payload(chunk.content, source, &ingested_at),
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(self.collection.name.clone(), points).wait(true))
            .await
            .map_err(qdrant_error)?;

        tracing::debug!(source = %source, points = ids.len(), "upserted points");
        Ok(ids)
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        self.collection.check_vector(vector)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let request =
            SearchPointsBuilder::new(self.collection.name.clone(), vector.to_vec(), top_k as u64)
                .with_payload(true);

        let response = self.client.search_points(request).await.map_err(qdrant_error)?;

        let mut results: Vec<SearchResult> = response
            .result
            .into_iter()
            .filter_map(|point| {
                let content = payload_str(&point.payload, "content");
                let source = payload_str(&point.payload, "source");
                match (content, source) {
                    (Some(content), Some(source)) => Some(SearchResult {
                        content,
                        source,
                        score: point.score,
                    }),
                    _ => {
                        tracing::warn!(id = ?point.id, "skipping point without content/source payload");
                        None
                    }
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let response = self
            .client
            .count(CountPointsBuilder::new(self.collection.name.clone()).exact(true))
            .await
            .map_err(qdrant_error)?;
        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    fn collection(&self) -> &CollectionConfig {
        &self.collection
    }
}
