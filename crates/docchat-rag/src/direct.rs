//! Fine-tuned model backend without retrieval

use async_trait::async_trait;
use std::sync::Arc;

use docchat_core::{
    BackendKind, ChatAnswer, ChatEndpoint, ChatMessage, ChatRequest, Error, FragmentStream,
    GenerationBackend, NO_ANSWER, Result, ndjson_fragments,
};

const PERSONA_PROMPT: &str = "You are a Czech-speaking assistant. Always answer exclusively in Czech, \
with correct Czech grammar and diacritics.";

/// Sends the bare question to a fine-tuned model under a fixed persona
pub struct DirectBackend {
    endpoint: Arc<dyn ChatEndpoint>,
    model: String,
}

impl DirectBackend {
    pub fn new(endpoint: Arc<dyn ChatEndpoint>, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, question: &str, stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(PERSONA_PROMPT), ChatMessage::user(question)],
            stream,
        }
    }
}

#[async_trait]
impl GenerationBackend for DirectBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Direct
    }

    async fn answer(&self, question: &str) -> Result<ChatAnswer> {
        let reply = self.endpoint.send(&self.request(question, false)).await?;
        if let Some(error) = reply.error {
            return Err(Error::Upstream(format!("model endpoint reported: {error}")));
        }

        let answer = reply
            .content()
            .filter(|text| !text.is_empty())
            .unwrap_or(NO_ANSWER);
        Ok(ChatAnswer::ungrounded(answer))
    }

    async fn answer_stream(&self, question: &str) -> Result<FragmentStream> {
        let body = self.endpoint.open_stream(&self.request(question, true)).await?;
        Ok(ndjson_fragments(body))
    }
}
