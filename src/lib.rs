pub mod core;
pub mod index;
pub mod llm;
pub mod prompt;
pub mod rag;
pub mod retrieval;
pub mod server;
pub mod state;
