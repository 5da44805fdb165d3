//! HTTP interface for DocChat
//!
//! Exposes chat (grounded and fine-tuned, blocking and streaming), ingestion,
//! the training-service proxy and health endpoints over axum.

mod config;
mod error;
mod routes;
mod state;
mod training;

#[cfg(test)]
mod tests;

pub use config::{AppConfig, EmbeddingsKind, StoreKind};
pub use error::{ApiError, ErrorBody, status_for};
pub use routes::{ChatInput, router};
pub use state::AppState;
pub use training::{ProxiedReply, TrainingProxy};
