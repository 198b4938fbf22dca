//! End-to-end tests over the HTTP surface with mocked upstream services:
//! real router, real relay, streamed body collected through a local socket.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use aeolus_backend::core::config::Settings;
use aeolus_backend::core::errors::ApiError;
use aeolus_backend::index::{IndexMatch, IndexStats, VectorIndex};
use aeolus_backend::llm::{ChatRequest, CompletionProvider, Embedder};
use aeolus_backend::prompt::{PromptBuilder, TrustedUrls};
use aeolus_backend::rag::RagOrchestrator;
use aeolus_backend::retrieval::Retriever;
use aeolus_backend::server::relay::LoggingSink;
use aeolus_backend::server::router::router;
use aeolus_backend::state::AppState;

const TRUSTED_URL: &str = "https://docs.example.com/manuals/V112/noise-curves-rev07.pdf";

struct StubEmbedder;

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ApiError> {
        Ok(vec![0.1; 8])
    }
}

struct StubIndex;

#[async_trait]
impl VectorIndex for StubIndex {
    async fn query(
        &self,
        _vector: &[f32],
        _namespace: &str,
        _top_k: usize,
    ) -> Result<Vec<IndexMatch>, ApiError> {
        Ok(vec![IndexMatch {
            id: "chunk-1".into(),
            score: Some(0.91),
            metadata: Some(json!({
                "text": "Noise mode N03 reduces output by 3%.",
                "page": 14,
                "url": TRUSTED_URL,
            })),
        }])
    }

    async fn list(&self, _namespace: &str) -> Result<Vec<IndexMatch>, ApiError> {
        Ok(vec![IndexMatch {
            id: "chunk-1".into(),
            score: None,
            metadata: Some(json!({"text": "stored passage"})),
        }])
    }

    async fn stats(&self) -> Result<IndexStats, ApiError> {
        Ok(IndexStats::default())
    }
}

/// Streams a fixed answer that cites the trusted URL.
struct StubCompletion;

#[async_trait]
impl CompletionProvider for StubCompletion {
    async fn chat(&self, _request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
        Ok("unused".into())
    }

    async fn stream_chat(
        &self,
        _request: ChatRequest,
        _model_id: &str,
    ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError> {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            for fragment in ["See ", TRUSTED_URL, " on page 14."] {
                if tx.send(Ok(fragment.to_string())).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }

    async fn health_check(&self) -> bool {
        true
    }
}

fn test_settings() -> Settings {
    Settings::from_lookup(|key| match key {
        "PINECONE_API_KEY" => Some("pk-test".into()),
        "PINECONE_INDEX_HOST" => Some("https://idx.invalid".into()),
        "OPENAI_API_KEY" => Some("sk-test".into()),
        _ => None,
    })
    .unwrap()
}

fn test_state() -> Arc<AppState> {
    let settings = test_settings();
    let trusted = Arc::new(TrustedUrls::from_lines(TRUSTED_URL));
    let retriever = Retriever::new(Arc::new(StubEmbedder), Arc::new(StubIndex));
    let prompt_builder = PromptBuilder::new(trusted);
    let completion: Arc<dyn CompletionProvider> = Arc::new(StubCompletion);
    let orchestrator = RagOrchestrator::new(
        retriever,
        prompt_builder,
        completion.clone(),
        settings.pinecone_namespace.clone(),
        settings.chat_model.clone(),
    );
    Arc::new(AppState {
        settings,
        orchestrator,
        completion,
        transcripts: Arc::new(LoggingSink),
    })
}

async fn spawn_app() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(test_state());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn chat_streams_ordered_frames_with_verbatim_trusted_url() {
    let addr = spawn_app().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("http://{addr}/api/chat"))
        .json(&json!({"message": "How does noise mode N03 affect output?"}))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());

    let body = res.text().await.unwrap();
    let first = body.find("0:\"See \"\n").unwrap();
    let second = body.find(&format!("0:\"{TRUSTED_URL}\"\n")).unwrap();
    let third = body.find("0:\" on page 14.\"\n").unwrap();
    assert!(first < second && second < third);
    assert!(body.ends_with("d:{\"finishReason\":\"stop\"}\n"));
}

#[tokio::test]
async fn empty_message_returns_invalid_input_code() {
    let addr = spawn_app().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("http://{addr}/api/chat"))
        .json(&json!({"message": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    let payload: serde_json::Value = res.json().await.unwrap();
    assert_eq!(payload["code"], "INVALID_INPUT");
    assert!(payload["error"].as_str().is_some());
}

#[tokio::test]
async fn oversized_message_returns_message_too_long_code() {
    let addr = spawn_app().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("http://{addr}/api/chat"))
        .json(&json!({"message": "x".repeat(4001)}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    let payload: serde_json::Value = res.json().await.unwrap();
    assert_eq!(payload["code"], "MESSAGE_TOO_LONG");
}

#[tokio::test]
async fn health_reports_both_services() {
    let addr = spawn_app().await;

    let res = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert!(res.status().is_success());

    let payload: serde_json::Value = res.json().await.unwrap();
    assert_eq!(payload["status"], "healthy");
    assert_eq!(payload["services"]["embeddingOrRetrieval"], true);
    assert_eq!(payload["services"]["generation"], true);
    assert!(payload["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn passages_endpoint_lists_namespace_contents() {
    let addr = spawn_app().await;

    let res = reqwest::get(format!("http://{addr}/api/passages/docs"))
        .await
        .unwrap();
    assert!(res.status().is_success());

    let payload: serde_json::Value = res.json().await.unwrap();
    assert_eq!(payload[0]["content"], "stored passage");
    assert_eq!(payload[0]["source_index"], 1);
}
