use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, CompletionProvider};
use crate::prompt::{PromptBuilder, DEFAULT_LANGUAGE};
use crate::retrieval::{Retriever, DEFAULT_TOP_K};

/// Hard limit on the trimmed question length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// One inbound chat request, as deserialized from the HTTP boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatQuery {
    pub message: String,
    pub language: Option<String>,
    pub namespace: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Per-dependency liveness flags reported by the health probe.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ServiceHealth {
    #[serde(rename = "embeddingOrRetrieval")]
    pub embedding_or_retrieval: bool,
    pub generation: bool,
}

impl ServiceHealth {
    pub fn healthy(&self) -> bool {
        self.embedding_or_retrieval && self.generation
    }
}

/// Top-level coordinator: validate → retrieve → build prompt. The transport
/// layer owns the generation step so it can stream the response body itself;
/// `answer` hands back the assembled messages and the target model.
pub struct RagOrchestrator {
    retriever: Retriever,
    prompt_builder: PromptBuilder,
    completion: Arc<dyn CompletionProvider>,
    default_namespace: String,
    chat_model: String,
}

impl RagOrchestrator {
    pub fn new(
        retriever: Retriever,
        prompt_builder: PromptBuilder,
        completion: Arc<dyn CompletionProvider>,
        default_namespace: String,
        chat_model: String,
    ) -> Self {
        Self {
            retriever,
            prompt_builder,
            completion,
            default_namespace,
            chat_model,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Validate the query, retrieve grounding passages, and assemble the
    /// prompt. Input validation happens before any network call; a retrieval
    /// failure aborts the request — an answer without retrieved context is
    /// never produced.
    pub async fn answer(&self, query: &ChatQuery) -> Result<(Vec<ChatMessage>, String), ApiError> {
        let message = query.message.trim();
        if message.is_empty() {
            return Err(ApiError::InvalidInput("message is empty".into()));
        }
        let length = message.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return Err(ApiError::MessageTooLong(length));
        }

        let namespace = query
            .namespace
            .as_deref()
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .unwrap_or(&self.default_namespace);

        let mut passages = self
            .retriever
            .search(message, namespace, DEFAULT_TOP_K)
            .await?;

        // Sanitize source URLs against the allow-list: a near-miss resolves
        // to its canonical form, anything unknown is dropped outright.
        for passage in &mut passages {
            if let Some(url) = passage.metadata.url.take() {
                passage.metadata.url = self
                    .prompt_builder
                    .trusted_urls()
                    .verify(&url)
                    .map(str::to_string);
            }
        }

        if passages.is_empty() {
            // Grounded-or-decline: with no usable context the request fails
            // rather than producing an unsourced answer.
            return Err(ApiError::Processing(format!(
                "no context found in namespace {namespace}"
            )));
        }

        let language = query.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);
        let messages = self
            .prompt_builder
            .build(message, &passages, &query.history, language);

        Ok((messages, self.chat_model.clone()))
    }

    /// Independent liveness probes for both upstream services. Never errors;
    /// an unreachable dependency reports as `false`.
    pub async fn health_check(&self) -> ServiceHealth {
        let embedding_or_retrieval = self.retriever.probe().await;
        let generation = self.completion.health_check().await;
        ServiceHealth {
            embedding_or_retrieval,
            generation,
        }
    }
}
