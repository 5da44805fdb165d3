//! Retrieval-grounded generation backend

use async_trait::async_trait;
use std::sync::Arc;

use docchat_core::{
    BackendKind, ChatAnswer, ChatMessage, ChatModel, EmbeddingProvider, FragmentStream,
    GenerationBackend, NO_ANSWER, Result, SearchResult, VectorStore, distinct_sources,
};

/// Number of chunks retrieved per question
pub const DEFAULT_TOP_K: usize = 5;

const SYSTEM_PROMPT: &str = "You are a Czech-speaking assistant. Always answer exclusively in Czech, \
with correct Czech grammar and diacritics. Answer only from the provided context. \
If the context does not contain the answer, say that you do not have enough information. \
Never make up information that is not in the context.";

/// Line written after every retrieved chunk in the context block
const SEPARATOR: &str = "---";

/// Context block and source list built from ranked search results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedContext {
    pub context: String,
    pub sources: Vec<String>,
}

/// Join ranked results into a context block, each followed by a separator line
pub fn build_context(results: &[SearchResult]) -> RetrievedContext {
    let mut context = String::new();
    for result in results {
        context.push_str(&result.content);
        context.push('\n');
        context.push_str(SEPARATOR);
        context.push('\n');
    }

    RetrievedContext {
        context,
        sources: distinct_sources(results.iter().map(|r| r.source.as_str())),
    }
}

/// Two-message prompt: the grounding instruction and the context plus question
pub fn grounded_prompt(context: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("Context:\n{context}\nQuestion: {question}")),
    ]
}

/// Answers from the document corpus: embed, retrieve, then generate
pub struct RagBackend {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    model: Arc<dyn ChatModel>,
    top_k: usize,
}

impl RagBackend {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            embedder,
            store,
            model,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve context for `question`
    pub async fn retrieve(&self, question: &str) -> Result<RetrievedContext> {
        let vector = self.embedder.embed(question).await?;
        let results = self.store.search(&vector, self.top_k).await?;
        tracing::debug!(results = results.len(), "retrieved context");
        Ok(build_context(&results))
    }
}

#[async_trait]
impl GenerationBackend for RagBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Rag
    }

    async fn answer(&self, question: &str) -> Result<ChatAnswer> {
        let retrieved = self.retrieve(question).await?;
        let prompt = grounded_prompt(&retrieved.context, question);

        let answer = self
            .model
            .complete(&prompt)
            .await?
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NO_ANSWER.to_string());

        Ok(ChatAnswer {
            answer,
            sources: retrieved.sources,
        })
    }

    async fn answer_stream(&self, question: &str) -> Result<FragmentStream> {
        let retrieved = self.retrieve(question).await?;
        self.model
            .complete_stream(&grounded_prompt(&retrieved.context, question))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::vector_store::MemoryVectorStore;
    use docchat_core::{CollectionConfig, EmbeddedChunk, collect_fragments, fragments_from};
    use std::sync::Mutex;

    /// Replies with fixed fragments and records the prompts it was given
    struct ScriptedModel {
        fragments: Vec<String>,
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn new(fragments: &[&str]) -> Self {
            Self {
                fragments: fragments.iter().map(|s| s.to_string()).collect(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            if self.fragments.is_empty() {
                return Ok(None);
            }
            Ok(Some(self.fragments.concat()))
        }

        async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<FragmentStream> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            Ok(fragments_from(self.fragments.clone()))
        }
    }

    async fn seeded_backend(model: Arc<ScriptedModel>) -> RagBackend {
        let embedder = Arc::new(HashEmbedder::new(256).unwrap());
        let store = Arc::new(MemoryVectorStore::new(CollectionConfig {
            dimension: 256,
            ..Default::default()
        }));
        for (source, text) in [
            ("pumps.md", "the water pump needs oil every spring"),
            ("solar.txt", "solar panels charge the battery"),
            ("pumps.md", "the pump uses twelve volt power"),
        ] {
            let vector = embedder.embed_text(text);
            store
                .upsert(
                    source,
                    vec![EmbeddedChunk {
                        content: text.to_string(),
                        vector,
                    }],
                )
                .await
                .unwrap();
        }
        RagBackend::new(embedder, store, model)
    }

    fn result(content: &str, source: &str, score: f32) -> SearchResult {
        SearchResult {
            content: content.to_string(),
            source: source.to_string(),
            score,
        }
    }

    #[test]
    fn test_build_context_separates_and_dedups() {
        let retrieved = build_context(&[
            result("first", "a.md", 0.9),
            result("second", "b.txt", 0.8),
            result("third", "a.md", 0.7),
        ]);
        assert_eq!(retrieved.context, "first\n---\nsecond\n---\nthird\n---\n");
        assert_eq!(retrieved.sources, vec!["a.md", "b.txt"]);
    }

    #[test]
    fn test_build_context_without_results() {
        let retrieved = build_context(&[]);
        assert!(retrieved.context.is_empty());
        assert!(retrieved.sources.is_empty());
    }

    #[tokio::test]
    async fn test_answer_carries_sources_and_prompt() {
        let model = Arc::new(ScriptedModel::new(&["Čerpadlo ", "potřebuje olej."]));
        let backend = seeded_backend(model.clone()).await;

        let answer = backend.answer("when does the water pump need oil").await.unwrap();
        assert_eq!(answer.answer, "Čerpadlo potřebuje olej.");
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0], "pumps.md");

        let prompts = model.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt[0].content, SYSTEM_PROMPT);
        assert!(prompt[1].content.starts_with("Context:\nthe water pump needs oil every spring\n---\n"));
        assert!(prompt[1].content.ends_with("\nQuestion: when does the water pump need oil"));
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back() {
        let backend = seeded_backend(Arc::new(ScriptedModel::new(&[]))).await;
        let answer = backend.answer("anything").await.unwrap();
        assert_eq!(answer.answer, NO_ANSWER);

        let backend = seeded_backend(Arc::new(ScriptedModel::new(&[""]))).await;
        assert_eq!(backend.answer("anything").await.unwrap().answer, NO_ANSWER);
    }

    #[tokio::test]
    async fn test_whitespace_reply_is_kept() {
        let backend = seeded_backend(Arc::new(ScriptedModel::new(&["  ", "\n"]))).await;

        let whole = backend.answer("anything").await.unwrap();
        assert_eq!(whole.answer, "  \n");
        let streamed = collect_fragments(backend.answer_stream("anything").await.unwrap())
            .await
            .unwrap();
        assert_eq!(streamed, whole.answer);
    }

    #[tokio::test]
    async fn test_stream_matches_answer() {
        let model = Arc::new(ScriptedModel::new(&["A", "hoj", " světe"]));
        let backend = seeded_backend(model).await;

        let whole = backend.answer("solar battery").await.unwrap();
        let streamed = collect_fragments(backend.answer_stream("solar battery").await.unwrap())
            .await
            .unwrap();
        assert_eq!(streamed, whole.answer);
    }

    #[tokio::test]
    async fn test_top_k_limits_context() {
        let model = Arc::new(ScriptedModel::new(&["ok"]));
        let backend = seeded_backend(model.clone()).await.with_top_k(1);
        assert_eq!(backend.top_k(), 1);

        let answer = backend.answer("solar panels").await.unwrap();
        assert_eq!(answer.sources, vec!["solar.txt"]);
        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts[0][1].content.matches(SEPARATOR).count(), 1);
    }

    #[test]
    fn test_kind() {
        assert_eq!(BackendKind::Rag.to_string(), "rag");
    }
}
