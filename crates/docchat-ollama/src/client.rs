//! Ollama client implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use docchat_core::{
    ByteStream, ChatEndpoint, ChatMessage, ChatModel, ChatReply, ChatRequest, EmbeddingProvider,
    Error, FragmentStream, Result, ndjson_fragments,
};

use crate::config::OllamaConfig;

/// Raw Ollama HTTP client
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: Url,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config.url()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Embedding provider backed by `model`
    pub fn embedder(&self, model: impl Into<String>, dimension: usize) -> OllamaEmbedder {
        OllamaEmbedder {
            client: self.clone(),
            model: model.into(),
            dimension,
        }
    }

    /// Chat model backed by `model`
    pub fn chat_model(&self, model: impl Into<String>) -> OllamaChatModel {
        OllamaChatModel {
            client: self.clone(),
            model: model.into(),
        }
    }

    /// POST a JSON body and return the response if it has a success status
    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;

        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(%url, %status, "Ollama request failed");
            return Err(Error::Upstream(format!(
                "{} returned status {}: {}",
                url, status, error_text
            )));
        }

        Ok(response)
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else if err.is_decode() {
        Error::Serialization(err.to_string())
    } else {
        Error::Upstream(err.to_string())
    }
}

#[async_trait]
impl ChatEndpoint for OllamaClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply> {
        tracing::debug!(model = %request.model, "sending chat request");
        let reply: ChatReply = self
            .post_json("api/chat", request)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        if let Some(error) = reply.error {
            return Err(Error::Upstream(format!("model endpoint reported: {error}")));
        }
        Ok(reply)
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream> {
        tracing::debug!(model = %request.model, "opening chat stream");
        let response = self.post_json("api/chat", request).await?;
        // the body stream owns the response; dropping it closes the connection
        Ok(response.bytes_stream().map(|chunk| chunk.map_err(transport_error)).boxed())
    }
}

/// Ollama embedding model
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    dimension: usize,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: &self.model,
            input: text,
        };

        let response: EmbedResponse = self
            .client
            .post_json("api/embed", &request)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        let embedding = response.embeddings.into_iter().next().ok_or_else(|| {
            Error::Upstream(format!("embedding model '{}' returned no vectors", self.model))
        })?;

        if embedding.len() != self.dimension {
            return Err(Error::InvalidConfiguration(format!(
                "embedding model '{}' produced width {}, expected {}",
                self.model,
                embedding.len(),
                self.dimension
            )));
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Ollama chat model delivering decoded text
#[derive(Debug, Clone)]
pub struct OllamaChatModel {
    client: OllamaClient,
    model: String,
}

impl OllamaChatModel {
    fn request(&self, messages: &[ChatMessage], stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            stream,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>> {
        let reply = self.client.send(&self.request(messages, false)).await?;
        Ok(reply.message.and_then(|message| message.content))
    }

    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<FragmentStream> {
        let body = self.client.open_stream(&self.request(messages, true)).await?;
        Ok(ndjson_fragments(body))
    }
}
