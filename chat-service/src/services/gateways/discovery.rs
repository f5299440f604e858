//! Watson Discovery v2 gateway.
//!
//! Queries a Discovery project and lists the documents of its collections.

use super::{
    check_base_url, ensure_success, DiscoveryGateway, GatewayError, IamAuthenticator,
    IndexedDocument, SearchResult,
};
use crate::config::DiscoveryConfig;
use crate::services::metrics;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::time::{Duration, Instant};

const GATEWAY: &str = "discovery";

pub struct DiscoveryClient {
    config: DiscoveryConfig,
    client: Client,
    auth: IamAuthenticator,
}

impl DiscoveryClient {
    pub fn new(
        config: DiscoveryConfig,
        iam_url: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        check_base_url(&config.url)?;
        check_base_url(iam_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::NotConfigured(format!("HTTP client: {}", e)))?;
        let auth = IamAuthenticator::new(config.api_key.clone(), iam_url, client.clone());

        Ok(Self {
            config,
            client,
            auth,
        })
    }

    fn project_url(&self, path: &str) -> String {
        format!(
            "{}/v2/projects/{}{}",
            self.config.url, self.config.project_id, path
        )
    }

    async fn run_query(&self, text: &str, count: u32) -> Result<Vec<SearchResult>, GatewayError> {
        let token = self.auth.access_token().await?;

        let request = QueryRequest {
            natural_language_query: text,
            count,
        };

        let response = self
            .client
            .traced_post(&self.project_url("/query"))
            .query(&[("version", self.config.version.as_str())])
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let body: QueryResponse = ensure_success(response).await?.json().await?;

        tracing::debug!(
            matching_results = body.matching_results,
            returned = body.results.len(),
            "Discovery query completed"
        );

        Ok(body
            .results
            .into_iter()
            .take(count as usize)
            .map(QueryResult::into_search_result)
            .collect())
    }

    async fn run_list_documents(&self) -> Result<Vec<IndexedDocument>, GatewayError> {
        let token = self.auth.access_token().await?;
        let version = [("version", self.config.version.as_str())];

        let response = self
            .client
            .traced_get(&self.project_url("/collections"))
            .query(&version)
            .bearer_auth(&token)
            .send()
            .await?;
        let collections: CollectionsResponse = ensure_success(response).await?.json().await?;

        let mut documents = Vec::new();
        for collection in collections.collections {
            let url = self.project_url(&format!(
                "/collections/{}/documents",
                collection.collection_id
            ));
            let response = self
                .client
                .traced_get(&url)
                .query(&version)
                .bearer_auth(&token)
                .send()
                .await?;
            let page: DocumentsResponse = ensure_success(response).await?.json().await?;

            if let Some(total) = page.matching_results {
                if total > page.documents.len() as u64 {
                    tracing::warn!(
                        collection_id = %collection.collection_id,
                        returned = page.documents.len(),
                        total,
                        "Discovery returned a partial document list"
                    );
                }
            }

            documents.extend(page.documents.into_iter().map(IndexedDocument::from));
        }

        Ok(documents)
    }
}

#[async_trait]
impl DiscoveryGateway for DiscoveryClient {
    async fn query(&self, text: &str, count: u32) -> Result<Vec<SearchResult>, GatewayError> {
        let start = Instant::now();
        let result = self.run_query(text, count).await;
        metrics::record_gateway_call(GATEWAY, "query", start.elapsed(), result.as_ref().err());
        result
    }

    async fn list_documents(&self) -> Result<Vec<IndexedDocument>, GatewayError> {
        let start = Instant::now();
        let result = self.run_list_documents().await;
        metrics::record_gateway_call(
            GATEWAY,
            "list_documents",
            start.elapsed(),
            result.as_ref().err(),
        );
        result
    }
}

// ============================================================================
// Discovery API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    natural_language_query: &'a str,
    count: u32,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matching_results: u64,
    #[serde(default)]
    results: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    document_id: String,
    #[serde(default)]
    document_passages: Vec<Passage>,
    /// Either a string or an array of strings depending on how the
    /// collection was enriched.
    #[serde(default)]
    text: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Passage {
    #[serde(default)]
    passage_text: String,
}

impl QueryResult {
    /// Prefer the top passage; fall back to the document body text.
    fn into_search_result(self) -> SearchResult {
        let passage = self
            .document_passages
            .into_iter()
            .map(|p| p.passage_text)
            .find(|t| !t.trim().is_empty());

        let body = self.text.and_then(|value| match value {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Array(items) => {
                let parts: Vec<String> = items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                (!parts.is_empty()).then(|| parts.join("\n"))
            }
            _ => None,
        });

        SearchResult {
            document_id: self.document_id,
            text: passage.or(body),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CollectionsResponse {
    #[serde(default)]
    collections: Vec<Collection>,
}

#[derive(Debug, Deserialize)]
struct Collection {
    collection_id: String,
}

#[derive(Debug, Deserialize)]
struct DocumentsResponse {
    #[serde(default)]
    matching_results: Option<u64>,
    #[serde(default)]
    documents: Vec<DocumentDetails>,
}

#[derive(Debug, Deserialize)]
struct DocumentDetails {
    document_id: String,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

impl From<DocumentDetails> for IndexedDocument {
    fn from(doc: DocumentDetails) -> Self {
        IndexedDocument {
            document_id: doc.document_id,
            created: doc.created,
            file_type: doc.file_type,
            size: doc.size,
        }
    }
}
