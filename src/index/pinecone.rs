use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{IndexMatch, IndexStats, VectorIndex};
use crate::core::errors::ApiError;

/// REST client for a Pinecone-style index data plane.
#[derive(Clone)]
pub struct PineconeClient {
    host: String,
    api_key: String,
    client: Client,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<IndexMatch>,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    vectors: Vec<ListedId>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct ListedId {
    id: String,
}

#[derive(Deserialize)]
struct Pagination {
    next: Option<String>,
}

impl PineconeClient {
    pub fn new(host: String, api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            host: host.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.host, path);
        let res = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Retrieval(format!("index request failed: {e}")))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Retrieval(format!(
                "index endpoint returned {status}: {text}"
            )));
        }

        res.json()
            .await
            .map_err(|e| ApiError::Retrieval(format!("malformed index payload: {e}")))
    }

    /// One page of vector ids from the list endpoint.
    async fn list_page(
        &self,
        namespace: &str,
        token: Option<&str>,
    ) -> Result<ListResponse, ApiError> {
        let url = format!("{}/vectors/list", self.host);
        let mut req = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .query(&[("namespace", namespace)]);
        if let Some(token) = token {
            req = req.query(&[("paginationToken", token)]);
        }

        let res = req
            .send()
            .await
            .map_err(|e| ApiError::Retrieval(format!("index list failed: {e}")))?;

        if !res.status().is_success() {
            let status = res.status();
            return Err(ApiError::Retrieval(format!(
                "index list returned {status}"
            )));
        }

        res.json()
            .await
            .map_err(|e| ApiError::Retrieval(format!("malformed list payload: {e}")))
    }

    /// Fetch full records (with metadata) for a batch of ids.
    async fn fetch(&self, ids: &[String], namespace: &str) -> Result<Vec<IndexMatch>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/vectors/fetch", self.host);
        let mut query: Vec<(&str, &str)> = vec![("namespace", namespace)];
        for id in ids {
            query.push(("ids", id.as_str()));
        }

        let res = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .query(&query)
            .send()
            .await
            .map_err(|e| ApiError::Retrieval(format!("index fetch failed: {e}")))?;

        if !res.status().is_success() {
            let status = res.status();
            return Err(ApiError::Retrieval(format!(
                "index fetch returned {status}"
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::Retrieval(format!("malformed fetch payload: {e}")))?;

        let mut matches = Vec::new();
        if let Some(vectors) = payload["vectors"].as_object() {
            for (id, record) in vectors {
                matches.push(IndexMatch {
                    id: id.clone(),
                    score: None,
                    metadata: record.get("metadata").cloned(),
                });
            }
        }
        Ok(matches)
    }
}

#[async_trait]
impl VectorIndex for PineconeClient {
    async fn query(
        &self,
        vector: &[f32],
        namespace: &str,
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, ApiError> {
        let body = json!({
            "vector": vector,
            "namespace": namespace,
            "topK": top_k,
            "includeMetadata": true,
        });

        let payload = self.post_json("/query", &body).await?;
        let response: QueryResponse = serde_json::from_value(payload)
            .map_err(|e| ApiError::Retrieval(format!("malformed query payload: {e}")))?;
        Ok(response.matches)
    }

    async fn list(&self, namespace: &str) -> Result<Vec<IndexMatch>, ApiError> {
        let mut all = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self.list_page(namespace, token.as_deref()).await?;
            let ids: Vec<String> = page.vectors.into_iter().map(|v| v.id).collect();
            all.extend(self.fetch(&ids, namespace).await?);

            match page.pagination.and_then(|p| p.next) {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(all)
    }

    async fn stats(&self) -> Result<IndexStats, ApiError> {
        let payload = self.post_json("/describe_index_stats", &json!({})).await?;
        serde_json::from_value(payload)
            .map_err(|e| ApiError::Retrieval(format!("malformed stats payload: {e}")))
    }
}
