use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::llm::ChatRequest;
use crate::rag::ChatQuery;
use crate::server::relay;
use crate::state::AppState;

/// POST /api/chat — answer a question as a stream of text frames.
///
/// The orchestrator validates and assembles the prompt; this handler owns
/// the streaming mechanics: it opens the generator stream and hands the
/// receiver to the relay, which becomes the response body.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(query): Json<ChatQuery>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, namespace = ?query.namespace, "chat request");

    let (messages, model) = state.orchestrator.answer(&query).await.map_err(|err| {
        tracing::warn!(%request_id, code = err.code(), "chat request failed: {err}");
        err
    })?;

    // Temperature 0 keeps the chat path reproducible for identical prompts.
    let request = ChatRequest::new(messages).with_temperature(0.0);
    let rx = state.completion.stream_chat(request, &model).await?;

    let question = query.message.trim().to_string();
    let body = relay::body(rx, question, state.transcripts.clone());

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response())
}

/// GET /api/passages/:namespace — administrative namespace inspection.
pub async fn list_passages(
    State(state): State<Arc<AppState>>,
    Path(namespace): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let passages = state.orchestrator.retriever().list_all(&namespace).await?;
    Ok(Json(passages))
}
