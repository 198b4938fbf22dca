pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiClient;
pub use provider::{CompletionProvider, Embedder};
pub use types::{ChatMessage, ChatRequest, ROLE_ASSISTANT, ROLE_SYSTEM, ROLE_USER};
