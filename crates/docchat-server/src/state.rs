//! Application state and component wiring

use std::path::PathBuf;
use std::sync::Arc;

use docchat_core::{EmbeddingProvider, Result, VectorStore, ensure_compatible};
use docchat_ollama::OllamaClient;
use docchat_rag::{
    Chunker, DirectBackend, FileTextExtractor, HashEmbedder, IngestionPipeline, MemoryVectorStore,
    QdrantVectorStore, QueryService, RagBackend,
};

use crate::config::{AppConfig, EmbeddingsKind, StoreKind};
use crate::training::TrainingProxy;

/// Shared handles used by every request
#[derive(Clone)]
pub struct AppState {
    pub queries: QueryService,
    pub ingestion: Arc<IngestionPipeline>,
    pub store: Arc<dyn VectorStore>,
    pub training: TrainingProxy,
    pub documents_path: PathBuf,
}

impl AppState {
    /// Build every component from configuration and initialize the store.
    ///
    /// Fails when the vectors the embedder actually produces do not fit the
    /// collection dimension.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let ollama = OllamaClient::new(&config.ollama)?;

        let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings {
            EmbeddingsKind::Ollama => Arc::new(ollama.embedder(
                config.ollama.embedding_model.clone(),
                config.ollama.embedding_dimension,
            )),
            EmbeddingsKind::Hash => Arc::new(HashEmbedder::new(config.ollama.embedding_dimension)?),
        };

        let store: Arc<dyn VectorStore> = match config.vector_store {
            StoreKind::Qdrant => Arc::new(QdrantVectorStore::new(
                &config.qdrant_url,
                config.collection(),
            )?),
            StoreKind::Memory => Arc::new(MemoryVectorStore::new(config.collection())),
        };

        ensure_compatible(embedder.as_ref(), store.collection()).await?;
        store.initialize().await?;
        tracing::info!(
            store = ?config.vector_store,
            embeddings = ?config.embeddings,
            collection = %store.collection().name,
            dimension = store.collection().dimension,
            "vector store ready"
        );

        let chat_model = Arc::new(ollama.chat_model(config.ollama.chat_model.clone()));
        let rag = RagBackend::new(embedder.clone(), store.clone(), chat_model)
            .with_top_k(config.top_k);
        let direct = DirectBackend::new(Arc::new(ollama), config.ollama.finetuned_model.clone());

        let ingestion = IngestionPipeline::new(
            Arc::new(FileTextExtractor::new()),
            Chunker::new(config.chunker())?,
            embedder,
            store.clone(),
        );

        Ok(Self {
            queries: QueryService::new(Arc::new(rag), Arc::new(direct)),
            ingestion: Arc::new(ingestion),
            store,
            training: TrainingProxy::new(&config.finetune_service_url, config.training_timeout())?,
            documents_path: config.documents_path.clone(),
        })
    }
}
