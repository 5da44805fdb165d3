//! Ollama integration for DocChat
//!
//! This crate provides the Ollama implementations of the embedding, chat model
//! and raw chat endpoint capabilities.

mod client;
mod config;


pub use client::{OllamaChatModel, OllamaClient, OllamaEmbedder};
pub use config::OllamaConfig;

// Re-export core types for convenience
pub use docchat_core::{
    ChatEndpoint, ChatMessage, ChatModel, ChatReply, ChatRequest, EmbeddingProvider, Error,
    Result,
};
