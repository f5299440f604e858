//! Mock gateway implementations for testing.

use super::{
    DiscoveryGateway, GatewayError, GenerationGateway, GenerationParams, IndexedDocument,
    SearchResult,
};
use async_trait::async_trait;
use std::sync::Mutex;

/// Mock discovery gateway returning canned results or a canned failure.
pub struct MockDiscoveryGateway {
    results: Vec<SearchResult>,
    documents: Vec<IndexedDocument>,
    failure: Option<String>,
    queries: Mutex<Vec<(String, u32)>>,
}

impl MockDiscoveryGateway {
    pub fn with_results(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            documents: Vec::new(),
            failure: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_documents(documents: Vec<IndexedDocument>) -> Self {
        Self {
            documents,
            ..Self::with_results(Vec::new())
        }
    }

    /// Every call fails with a network error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::with_results(Vec::new())
        }
    }

    /// Queries received so far, with their requested counts.
    pub fn queries(&self) -> Vec<(String, u32)> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<(), GatewayError> {
        match &self.failure {
            Some(message) => Err(GatewayError::NetworkError(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DiscoveryGateway for MockDiscoveryGateway {
    async fn query(&self, text: &str, count: u32) -> Result<Vec<SearchResult>, GatewayError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push((text.to_string(), count));
        }
        self.check()?;
        Ok(self.results.iter().take(count as usize).cloned().collect())
    }

    async fn list_documents(&self) -> Result<Vec<IndexedDocument>, GatewayError> {
        self.check()?;
        Ok(self.documents.clone())
    }
}

/// Mock generation gateway that records prompts.
pub struct MockGenerationGateway {
    outputs: Vec<String>,
    failure: Option<String>,
    prompts: Mutex<Vec<(String, GenerationParams)>>,
}

impl MockGenerationGateway {
    pub fn with_outputs(outputs: Vec<String>) -> Self {
        Self {
            outputs,
            failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with an API error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::with_outputs(Vec::new())
        }
    }

    /// Prompts received so far, with their parameters.
    pub fn prompts(&self) -> Vec<(String, GenerationParams)> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerationGateway for MockGenerationGateway {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Vec<String>, GatewayError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((prompt.to_string(), params.clone()));
        }

        match &self.failure {
            Some(message) => Err(GatewayError::ApiError {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(self.outputs.clone()),
        }
    }
}
