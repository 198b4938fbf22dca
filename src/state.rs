use std::sync::Arc;

use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::index::PineconeClient;
use crate::llm::{CompletionProvider, Embedder, OpenAiClient};
use crate::prompt::{PromptBuilder, TrustedUrls};
use crate::rag::RagOrchestrator;
use crate::retrieval::Retriever;
use crate::server::relay::{LoggingSink, TranscriptSink};

/// Application state shared across all routes.
///
/// Every client is constructed exactly once here and injected explicitly;
/// nothing in the request path creates connections or mutates shared state
/// after this point.
pub struct AppState {
    pub settings: Settings,
    pub orchestrator: RagOrchestrator,
    pub completion: Arc<dyn CompletionProvider>,
    pub transcripts: Arc<dyn TranscriptSink>,
}

impl AppState {
    pub fn initialize(settings: Settings) -> Result<Arc<Self>, ApiError> {
        let trusted_urls = Arc::new(TrustedUrls::load(&settings.trusted_urls_path)?);
        tracing::info!(count = trusted_urls.len(), "loaded trusted URL list");

        let openai = Arc::new(OpenAiClient::new(
            settings.openai_base_url.clone(),
            settings.openai_api_key.clone(),
            settings.embedding_model.clone(),
            settings.simple_model.clone(),
            settings.request_timeout,
        ));
        let index = Arc::new(PineconeClient::new(
            settings.pinecone_index_host.clone(),
            settings.pinecone_api_key.clone(),
            settings.request_timeout,
        ));

        let embedder: Arc<dyn Embedder> = openai.clone();
        let completion: Arc<dyn CompletionProvider> = openai;

        let retriever = Retriever::new(embedder, index);
        let prompt_builder = PromptBuilder::new(trusted_urls);
        let orchestrator = RagOrchestrator::new(
            retriever,
            prompt_builder,
            completion.clone(),
            settings.pinecone_namespace.clone(),
            settings.chat_model.clone(),
        );

        Ok(Arc::new(AppState {
            settings,
            orchestrator,
            completion,
            transcripts: Arc::new(LoggingSink),
        }))
    }
}
