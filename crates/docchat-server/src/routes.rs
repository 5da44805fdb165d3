//! HTTP routes

use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use docchat_core::{BackendKind, ChatAnswer, FragmentStream, IngestReport};

use crate::error::ApiError;
use crate::state::AppState;
use crate::training::ProxiedReply;

/// Chat body; a parse failure surfaces as an `InvalidInput` error
type ChatBody = std::result::Result<Json<ChatInput>, JsonRejection>;

/// Body of the chat endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatInput {
    pub message: String,
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/chat/stream", post(chat_stream))
        .route("/api/chat/finetuned", post(finetuned))
        .route("/api/chat/finetuned/stream", post(finetuned_stream))
        .route("/api/ingest", post(ingest))
        .route("/api/train/start", post(train_start))
        .route("/api/train/status", get(train_status))
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn chat(
    State(state): State<AppState>,
    body: ChatBody,
) -> Result<Json<ChatAnswer>, ApiError> {
    let Json(input) = body?;
    let answer = state.queries.ask(BackendKind::Rag, &input.message).await?;
    Ok(Json(answer))
}

async fn chat_stream(
    State(state): State<AppState>,
    body: ChatBody,
) -> Result<Response, ApiError> {
    let Json(input) = body?;
    let stream = state.queries.ask_stream(BackendKind::Rag, &input.message).await?;
    Ok(text_stream(stream))
}

async fn finetuned(
    State(state): State<AppState>,
    body: ChatBody,
) -> Result<Json<ChatAnswer>, ApiError> {
    let Json(input) = body?;
    let answer = state.queries.ask(BackendKind::Direct, &input.message).await?;
    Ok(Json(answer))
}

async fn finetuned_stream(
    State(state): State<AppState>,
    body: ChatBody,
) -> Result<Response, ApiError> {
    let Json(input) = body?;
    let stream = state.queries.ask_stream(BackendKind::Direct, &input.message).await?;
    Ok(text_stream(stream))
}

/// Plain-text chunked response; an error mid-stream aborts the body
fn text_stream(stream: FragmentStream) -> Response {
    let body = stream.map(|fragment| {
        if let Err(e) = &fragment {
            tracing::error!(kind = e.kind(), error = %e, "answer stream aborted");
        }
        fragment
    });

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response()
}

async fn ingest(State(state): State<AppState>) -> Result<Json<IngestReport>, ApiError> {
    let report = state.ingestion.ingest(&state.documents_path).await?;
    Ok(Json(report))
}

async fn train_start(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(proxied(state.training.start().await?))
}

async fn train_status(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(proxied(state.training.status().await?))
}

fn proxied(reply: ProxiedReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
        .into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK" }))
}

async fn stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let collection = state.store.collection();
    let chunks = state.store.count().await?;
    Ok(Json(json!({
        "collection": collection.name,
        "dimension": collection.dimension,
        "chunks": chunks,
    })))
}
