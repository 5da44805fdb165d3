//! Core traits and types for DocChat
//!
//! This crate defines the data model, error taxonomy and capability-facing
//! interfaces shared by the ingestion and query paths: text extraction,
//! embeddings, vector storage, chat generation and the two generation backends.

pub mod error;
pub mod extractor;
pub mod generation;
pub mod stream;
pub mod types;
pub mod vector_store;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
pub use extractor::{SUPPORTED_EXTENSIONS, TextExtractor, supported_extension};
pub use generation::{
    BackendKind, ChatEndpoint, ChatMessage, ChatModel, ChatReply, ChatRequest, GenerationBackend,
    NO_ANSWER, ReplyMessage, Role,
};
pub use stream::{ByteStream, FragmentStream, collect_fragments, fragments_from, ndjson_fragments};
pub use types::*;
pub use vector_store::{
    CollectionConfig, EmbeddingProvider, Metric, VectorStore, ensure_compatible,
};
