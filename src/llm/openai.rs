use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::provider::{CompletionProvider, Embedder};
use super::types::{ChatMessage, ChatRequest};
use crate::core::errors::ApiError;

/// Client for an OpenAI-compatible API: embeddings plus sync and streaming
/// chat completions. One instance is constructed at startup and shared; the
/// inner `reqwest::Client` pools connections across requests.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    embedding_model: String,
    simple_model: String,
    client: Client,
    // Streaming must not be cut off by the total-request timeout, so the
    // bounded client is only used for the non-streaming calls.
    stream_client: Client,
}

impl OpenAiClient {
    pub fn new(
        base_url: String,
        api_key: String,
        embedding_model: String,
        simple_model: String,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        let stream_client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            embedding_model,
            simple_model,
            client,
            stream_client,
        }
    }

    /// One-shot completion against the smaller model at a non-zero
    /// temperature. Used by the analytics summary path, not by chat.
    pub async fn complete_simple(&self, prompt: &str) -> Result<String, ApiError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]).with_temperature(0.7);
        let model = self.simple_model.clone();
        self.chat(request, &model).await
    }
}

fn chat_body(request: &ChatRequest, model_id: &str, stream: bool) -> Value {
    let mut body = json!({
        "model": model_id,
        "messages": request.messages,
        "stream": stream,
    });
    if let Some(obj) = body.as_object_mut() {
        if let Some(t) = request.temperature {
            obj.insert("temperature".to_string(), json!(t));
        }
        if let Some(m) = request.max_tokens {
            obj.insert("max_tokens".to_string(), json!(m));
        }
    }
    body
}

/// One parsed server-sent-event line from the completion stream.
#[derive(Debug, PartialEq)]
pub enum SseEvent {
    Fragment(String),
    Done,
    Ignore,
}

pub fn parse_sse_line(line: &str) -> SseEvent {
    let line = line.trim();
    if line.is_empty() {
        return SseEvent::Ignore;
    }
    if line == "data: [DONE]" {
        return SseEvent::Done;
    }
    let Some(data) = line.strip_prefix("data: ") else {
        return SseEvent::Ignore;
    };
    match serde_json::from_str::<Value>(data) {
        Ok(payload) => match payload["choices"][0]["delta"]["content"].as_str() {
            Some(content) if !content.is_empty() => SseEvent::Fragment(content.to_string()),
            _ => SseEvent::Ignore,
        },
        Err(_) => SseEvent::Ignore,
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.embedding_model,
            "input": text,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Embedding(format!("embedding request failed: {e}")))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Embedding(format!(
                "embedding endpoint returned {status}: {text}"
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::Embedding(format!("malformed embedding payload: {e}")))?;

        let vector: Vec<f32> = payload["data"][0]["embedding"]
            .as_array()
            .map(|vals| {
                vals.iter()
                    .filter_map(|v| v.as_f64().map(|f| f as f32))
                    .collect()
            })
            .unwrap_or_default();

        if vector.is_empty() {
            return Err(ApiError::Embedding(
                "embedding payload contained no vector".into(),
            ));
        }

        Ok(vector)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = chat_body(&request, model_id, false);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Generation(format!("completion request failed: {e}")))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Generation(format!(
                "completion endpoint returned {status}: {text}"
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::Generation(format!("malformed completion payload: {e}")))?;

        match payload["choices"][0]["message"]["content"].as_str() {
            Some(content) if !content.trim().is_empty() => Ok(content.to_string()),
            _ => Err(ApiError::Generation(
                "completion payload contained no content".into(),
            )),
        }
    }

    async fn stream_chat(
        &self,
        request: ChatRequest,
        model_id: &str,
    ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = chat_body(&request, model_id, true);

        let res = self
            .stream_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Generation(format!("completion request failed: {e}")))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Generation(format!(
                "completion endpoint returned {status}: {text}"
            )));
        }

        let (tx, rx) = mpsc::channel(32);
        let mut stream = res.bytes_stream();

        tokio::spawn(async move {
            // SSE lines can be split across transport chunks, so unparsed
            // tail bytes are carried over between reads.
            let mut buffer = String::new();
            while let Some(item) = stream.next().await {
                match item {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        while let Some(pos) = buffer.find('\n') {
                            let line = buffer[..pos].to_string();
                            buffer.drain(..=pos);
                            match parse_sse_line(&line) {
                                SseEvent::Fragment(content) => {
                                    // Receiver dropped means the caller went
                                    // away; stop reading so the upstream
                                    // connection is released.
                                    if tx.send(Ok(content)).await.is_err() {
                                        return;
                                    }
                                }
                                SseEvent::Done => return,
                                SseEvent::Ignore => {}
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx
                            .send(Err(ApiError::Generation(format!("stream aborted: {e}"))))
                            .await;
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/v1/models", self.base_url);
        match self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}
