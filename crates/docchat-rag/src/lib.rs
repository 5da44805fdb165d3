//! RAG (Retrieval-Augmented Generation) engine for DocChat
//!
//! This crate provides the ingestion path (text extraction, chunking,
//! embedding, vector storage) and the two generation backends behind the
//! query service.

mod chunker;
mod direct;
mod embedding;
mod engine;
mod extractor;
mod ingest;
mod query;
mod vector_store;


pub use chunker::{Chunker, ChunkerConfig};
pub use direct::DirectBackend;
pub use embedding::HashEmbedder;
pub use engine::{DEFAULT_TOP_K, RagBackend, RetrievedContext, build_context, grounded_prompt};
pub use extractor::FileTextExtractor;
pub use ingest::{IngestionPipeline, list_documents};
pub use query::QueryService;
pub use vector_store::{MemoryVectorStore, QdrantVectorStore, cosine_similarity};

// Re-export core types for convenience
pub use docchat_core::{
    BackendKind, ChatAnswer, EmbeddingProvider, Error, GenerationBackend, IngestReport, Result,
    SearchResult, VectorStore,
};
