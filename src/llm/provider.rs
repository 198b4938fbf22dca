use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// Text-to-vector seam. One outbound call per invocation, no internal retry;
/// retry policy belongs to the caller.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;
}

/// Chat-completion seam.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Chat completion (non-streaming).
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError>;

    /// Chat completion (streaming). Each received item is one incremental
    /// text fragment; a transport failure mid-stream arrives as an `Err`
    /// item. Dropping the receiver cancels the upstream connection.
    async fn stream_chat(
        &self,
        request: ChatRequest,
        model_id: &str,
    ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError>;

    /// Liveness probe. Never errors; unreachable means `false`.
    async fn health_check(&self) -> bool;
}
