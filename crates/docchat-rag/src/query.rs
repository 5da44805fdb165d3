//! Routes questions to a generation backend

use std::sync::Arc;

use docchat_core::{BackendKind, ChatAnswer, Error, FragmentStream, GenerationBackend, Result};

/// Front door for questions. Holds no state beyond the two backends and
/// passes their errors through unchanged.
#[derive(Clone)]
pub struct QueryService {
    rag: Arc<dyn GenerationBackend>,
    direct: Arc<dyn GenerationBackend>,
}

impl QueryService {
    pub fn new(rag: Arc<dyn GenerationBackend>, direct: Arc<dyn GenerationBackend>) -> Self {
        Self { rag, direct }
    }

    pub fn backend(&self, kind: BackendKind) -> &dyn GenerationBackend {
        match kind {
            BackendKind::Rag => self.rag.as_ref(),
            BackendKind::Direct => self.direct.as_ref(),
        }
    }

    pub async fn ask(&self, kind: BackendKind, question: &str) -> Result<ChatAnswer> {
        validate_question(question)?;
        tracing::debug!(backend = %kind, "answering question");
        self.backend(kind).answer(question).await
    }

    pub async fn ask_stream(&self, kind: BackendKind, question: &str) -> Result<FragmentStream> {
        validate_question(question)?;
        tracing::debug!(backend = %kind, "streaming answer");
        self.backend(kind).answer_stream(question).await
    }
}

fn validate_question(question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(Error::InvalidInput("message must not be empty".to_string()));
    }
    Ok(())
}
