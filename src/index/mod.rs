use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::core::errors::ApiError;

pub mod pinecone;

pub use pinecone::PineconeClient;

/// One raw match from the vector index, before mapping into a passage.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    #[serde(default)]
    pub total_vector_count: u64,
    #[serde(default)]
    pub dimension: Option<u64>,
}

/// Namespaced similarity-search seam over the hosted vector index.
///
/// Implementations return matches in the index's own order, which is
/// similarity-descending; callers rely on that ordering and must not re-sort.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Nearest-neighbour query within `namespace`, metadata included.
    async fn query(
        &self,
        vector: &[f32],
        namespace: &str,
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, ApiError>;

    /// Every stored vector in `namespace`, for administrative inspection.
    async fn list(&self, namespace: &str) -> Result<Vec<IndexMatch>, ApiError>;

    /// Index statistics, used as the liveness probe.
    async fn stats(&self) -> Result<IndexStats, ApiError>;
}
