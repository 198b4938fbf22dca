use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::errors::ApiError;
use crate::index::{IndexMatch, VectorIndex};
use crate::llm::Embedder;

pub const DEFAULT_TOP_K: usize = 5;

/// Metadata fields the prompt layer knows about, plus whatever else the
/// index stored on the record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassageMetadata {
    pub page: Option<i64>,
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// One retrieved passage, in index order. `source_index` is 1-based and
/// is the number the prompt cites as `[Source i]`.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedPassage {
    pub content: String,
    pub score: f32,
    pub source_index: usize,
    pub metadata: PassageMetadata,
}

/// Similarity search over the vector index: embeds the query, queries the
/// index, and maps raw matches into passages. The index's own ordering is
/// authoritative and is preserved as-is.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    pub async fn search(
        &self,
        query: &str,
        namespace: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, ApiError> {
        let vector = self.embedder.embed(query).await?;
        let matches = self.index.query(&vector, namespace, top_k).await?;
        let passages = map_matches(matches);
        tracing::debug!(
            namespace,
            count = passages.len(),
            "retrieved context passages"
        );
        Ok(passages)
    }

    /// Full contents of a namespace, for the admin inspection view.
    pub async fn list_all(&self, namespace: &str) -> Result<Vec<RetrievedPassage>, ApiError> {
        let matches = self.index.list(namespace).await?;
        Ok(map_matches(matches))
    }

    /// Index liveness, surfaced through the orchestrator's health check.
    pub async fn probe(&self) -> bool {
        self.index.stats().await.is_ok()
    }
}

/// Map raw matches to passages: pull content out of the `text` metadata
/// field, default a missing score to 0, lift `page`/`url` into typed fields,
/// and drop matches with empty trimmed content. Source indices are assigned
/// after the drop so the numbering the prompt cites has no gaps.
fn map_matches(matches: Vec<IndexMatch>) -> Vec<RetrievedPassage> {
    matches
        .into_iter()
        .filter_map(|m| {
            let mut extra = match m.metadata {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            };
            let content = extra
                .remove("text")
                .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
                .unwrap_or_default();
            if content.is_empty() {
                return None;
            }
            let page = extra.remove("page").and_then(|v| match v {
                Value::Number(n) => n.as_f64().map(|f| f as i64),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            });
            let url = extra
                .remove("url")
                .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
                .filter(|s| !s.is_empty());

            Some((content, m.score.unwrap_or(0.0), page, url, extra))
        })
        .enumerate()
        .map(
            |(i, (content, score, page, url, extra))| RetrievedPassage {
                content,
                score,
                source_index: i + 1,
                metadata: PassageMetadata { page, url, extra },
            },
        )
        .collect()
}
