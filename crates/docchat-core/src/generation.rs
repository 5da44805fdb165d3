//! Generation capabilities and backend contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::stream::{ByteStream, FragmentStream};
use crate::{ChatAnswer, Result};

/// Substituted when a model returns no content or an empty string
pub const NO_ANSWER: &str = "No answer.";

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request body of a chat endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

/// Message fragment inside a chat reply; fields may be absent in deltas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// One chat reply record: the whole reply, or one delta of a stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub message: Option<ReplyMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    pub fn content(&self) -> Option<&str> {
        self.message.as_ref()?.content.as_deref()
    }
}

/// Trait for chat models that deliver decoded text
///
/// Used by the grounded backend: fragments arrive already decoded and are
/// forwarded without further framing.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a prompt; `None` when the model produced no content
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>>;

    /// Complete a prompt incrementally
    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<FragmentStream>;
}

/// Trait for raw chat endpoints
///
/// Used by the direct backend, which decodes the endpoint's NDJSON framing
/// itself.
#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    /// Send a non-streaming request and decode the single reply record
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply>;

    /// Send a streaming request and return the undecoded response body
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream>;
}

/// Which generation backend a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Retrieval-grounded answers over the document corpus
    Rag,
    /// Fine-tuned model answering without retrieval
    Direct,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Rag => write!(f, "rag"),
            BackendKind::Direct => write!(f, "direct"),
        }
    }
}

/// Trait for generation backends
///
/// Both operations answer the same question; concatenating every fragment of
/// `answer_stream` gives the text `answer` would return. The one exception is
/// an absent or empty reply, which `answer` replaces with [`NO_ANSWER`] and
/// the stream ends without a fragment.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Which backend this is
    fn kind(&self) -> BackendKind;

    /// Answer a question, waiting for the complete response
    async fn answer(&self, question: &str) -> Result<ChatAnswer>;

    /// Answer a question as a lazy sequence of text fragments.
    /// Dropping the stream releases the underlying connection.
    async fn answer_stream(&self, question: &str) -> Result<FragmentStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_wire_format() {
        let request = ChatRequest {
            model: "gemma2-finetuned".to_string(),
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
            stream: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gemma2-finetuned",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ],
                "stream": true
            })
        );
    }

    #[test]
    fn test_chat_reply_tolerates_missing_fields() {
        let reply: ChatReply = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(reply.done);
        assert_eq!(reply.content(), None);

        let reply: ChatReply =
            serde_json::from_str(r#"{"message":{"role":"assistant","content":"Ahoj"},"done":false}"#)
                .unwrap();
        assert_eq!(reply.content(), Some("Ahoj"));
    }
}
