//! In-process tests of the HTTP surface

#[cfg(test)]
mod http_tests {
    use crate::{AppState, TrainingProxy, router};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use bytes::Bytes;
    use docchat_core::{
        ByteStream, ChatEndpoint, ChatMessage, ChatModel, ChatReply, ChatRequest,
        CollectionConfig, FragmentStream, ReplyMessage, Result, VectorStore, fragments_from,
    };
    use docchat_rag::{
        Chunker, DirectBackend, FileTextExtractor, HashEmbedder, IngestionPipeline,
        MemoryVectorStore, QueryService, RagBackend,
    };
    use futures::StreamExt;
    use insta::assert_json_snapshot;
    use serde_json::{Value, json};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const DIMENSION: usize = 128;

    /// Streams a greeting in three fragments
    struct GreetingModel;

    #[async_trait]
    impl ChatModel for GreetingModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<Option<String>> {
            Ok(Some("Dobrý den, jak mohu pomoci?".to_string()))
        }

        async fn complete_stream(&self, _messages: &[ChatMessage]) -> Result<FragmentStream> {
            Ok(fragments_from(vec![
                "Dobrý den,".to_string(),
                " jak mohu".to_string(),
                " pomoci?".to_string(),
            ]))
        }
    }

    /// Fine-tuned endpoint whose stream breaks after one good record
    struct BrokenStreamEndpoint;

    #[async_trait]
    impl ChatEndpoint for BrokenStreamEndpoint {
        async fn send(&self, _request: &ChatRequest) -> Result<ChatReply> {
            Ok(ChatReply {
                message: Some(ReplyMessage {
                    role: Some("assistant".to_string()),
                    content: Some("Ahoj!".to_string()),
                }),
                done: true,
                error: None,
            })
        }

        async fn open_stream(&self, _request: &ChatRequest) -> Result<ByteStream> {
            let chunks: Vec<Result<Bytes>> = vec![
                Ok(Bytes::from_static(b"{\"message\":{\"content\":\"Ahoj\"}}\n")),
                Ok(Bytes::from_static(b"<html>502 Bad Gateway</html>\n")),
            ];
            Ok(futures::stream::iter(chunks).boxed())
        }
    }

    struct Harness {
        store: Arc<MemoryVectorStore>,
        state: AppState,
    }

    fn harness(documents: &Path, training_url: &str) -> Harness {
        let embedder = Arc::new(HashEmbedder::new(DIMENSION).unwrap());
        let store = Arc::new(MemoryVectorStore::new(CollectionConfig {
            dimension: DIMENSION,
            ..Default::default()
        }));
        let rag = RagBackend::new(embedder.clone(), store.clone(), Arc::new(GreetingModel));
        let direct = DirectBackend::new(Arc::new(BrokenStreamEndpoint), "gemma2-finetuned");
        let ingestion = IngestionPipeline::new(
            Arc::new(FileTextExtractor::new()),
            Chunker::default(),
            embedder,
            store.clone(),
        );

        let state = AppState {
            queries: QueryService::new(Arc::new(rag), Arc::new(direct)),
            ingestion: Arc::new(ingestion),
            store: store.clone(),
            training: TrainingProxy::new(training_url, Duration::from_secs(5)).unwrap(),
            documents_path: documents.to_path_buf(),
        };
        Harness { store, state }
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1_000_000)
            .await
            .unwrap();
        (status, body)
    }

    async fn send_json(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(state, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("token{i}")).collect::<Vec<_>>().join(" ")
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(dir.path(), "http://127.0.0.1:9");
        let (status, body) = send_json(h.state, empty("GET", "/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_json_snapshot!(body, @r###"
        {
          "status": "OK"
        }
        "###);
    }

    #[tokio::test]
    async fn test_ingest_missing_directory_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(&dir.path().join("missing"), "http://127.0.0.1:9");

        let (status, body) = send_json(h.state, empty("POST", "/api/ingest")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "DirectoryNotFound");
        assert_eq!(h.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ingest_reports_counts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("handbook.txt"), words(520)).unwrap();
        std::fs::write(dir.path().join("logo.svg"), "<svg/>").unwrap();
        let h = harness(dir.path(), "http://127.0.0.1:9");

        let (status, body) = send_json(h.state.clone(), empty("POST", "/api/ingest")).await;
        assert_eq!(status, StatusCode::OK);
        assert_json_snapshot!(body, @r###"
        {
          "chunkCount": 2,
          "documentCount": 1
        }
        "###);

        let (_, stats) = send_json(h.state, empty("GET", "/api/stats")).await;
        assert_eq!(stats["chunks"], 2);
        assert_eq!(stats["collection"], "documents");
        assert_eq!(stats["dimension"], DIMENSION);
    }

    #[tokio::test]
    async fn test_chat_returns_answer_and_sources() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("faq.md"), "Kancelář je otevřena ve všední dny.").unwrap();
        let h = harness(dir.path(), "http://127.0.0.1:9");
        send(h.state.clone(), empty("POST", "/api/ingest")).await;

        let (status, body) = send_json(
            h.state,
            post_json("/api/chat", json!({"message": "Kdy je kancelář otevřena?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_json_snapshot!(body, @r###"
        {
          "answer": "Dobrý den, jak mohu pomoci?",
          "sources": [
            "faq.md"
          ]
        }
        "###);
    }

    #[tokio::test]
    async fn test_chat_stream_is_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(dir.path(), "http://127.0.0.1:9");

        let response = router(h.state)
            .oneshot(post_json("/api/chat/stream", json!({"message": "Ahoj"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
        let body = axum::body::to_bytes(response.into_body(), 1_000_000)
            .await
            .unwrap();
        assert_eq!(&body[..], "Dobrý den, jak mohu pomoci?".as_bytes());
    }

    #[tokio::test]
    async fn test_blank_message_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(dir.path(), "http://127.0.0.1:9");

        for uri in ["/api/chat", "/api/chat/stream", "/api/chat/finetuned"] {
            let (status, body) =
                send_json(h.state.clone(), post_json(uri, json!({"message": "   "}))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"], "InvalidInput");
        }
    }

    #[tokio::test]
    async fn test_unreadable_body_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(dir.path(), "http://127.0.0.1:9");

        let malformed = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from("{\"message\": "))
            .unwrap();
        let without_type = Request::builder()
            .method("POST")
            .uri("/api/chat/finetuned")
            .body(Body::from("{\"message\": \"Ahoj\"}"))
            .unwrap();

        for request in [
            malformed,
            without_type,
            post_json("/api/chat/stream", json!({"question": "Ahoj"})),
            post_json("/api/chat/finetuned/stream", json!({"message": 7})),
        ] {
            let (status, body) = send_json(h.state.clone(), request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "InvalidInput");
            assert!(body["message"].as_str().unwrap().starts_with("Invalid input"));
        }
    }

    #[tokio::test]
    async fn test_finetuned_has_empty_sources() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(dir.path(), "http://127.0.0.1:9");

        let (status, body) = send_json(
            h.state,
            post_json("/api/chat/finetuned", json!({"message": "Ahoj"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"answer": "Ahoj!", "sources": []}));
    }

    #[tokio::test]
    async fn test_finetuned_stream_aborts_on_malformed_line() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(dir.path(), "http://127.0.0.1:9");

        let response = router(h.state)
            .oneshot(post_json("/api/chat/finetuned/stream", json!({"message": "Ahoj"})))
            .await
            .unwrap();
        // headers are already sent when the bad line arrives
        assert_eq!(response.status(), StatusCode::OK);
        let result = axum::body::to_bytes(response.into_body(), 1_000_000).await;
        assert!(result.is_err());
    }

    async fn spawn_training_stub() -> String {
        let app = Router::new()
            .route(
                "/api/train/start",
                post(|| async { (StatusCode::ACCEPTED, Json(json!({"started": true}))) }),
            )
            .route(
                "/api/train/status",
                get(|| async {
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(json!({"state": "busy", "progress": 0.4})),
                    )
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_training_proxy_passes_status_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let url = spawn_training_stub().await;
        let h = harness(dir.path(), &url);

        let (status, body) = send_json(h.state.clone(), empty("POST", "/api/train/start")).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, json!({"started": true}));

        let response = router(h.state)
            .oneshot(empty("GET", "/api/train/status"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_training_service_down_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let h = harness(dir.path(), &format!("http://{addr}"));

        let (status, body) = send_json(h.state, empty("GET", "/api/train/status")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "UpstreamError");
    }
}
