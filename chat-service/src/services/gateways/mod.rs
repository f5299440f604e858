//! Hosted-service gateway abstractions and implementations.
//!
//! The chat pipeline talks to two collaborators through these traits: a
//! document search index (Watson Discovery) and a text-generation model
//! (watsonx.ai). Every call returns an explicit `Result` so callers decide
//! how each failure degrades.

pub mod discovery;
pub mod iam;
pub mod mock;
pub mod watsonx;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use discovery::DiscoveryClient;
pub use iam::IamAuthenticator;
pub use watsonx::WatsonxClient;

/// Error type for gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Gateway not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NotConfigured(_) => "not_configured",
            GatewayError::Authentication(_) => "authentication",
            GatewayError::ApiError { .. } => "api_error",
            GatewayError::NetworkError(_) => "network",
            GatewayError::MalformedResponse(_) => "malformed_response",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::MalformedResponse(err.to_string())
        } else {
            GatewayError::NetworkError(err.to_string())
        }
    }
}

/// One ranked hit from a search query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub document_id: String,
    /// Best text fragment for the hit, if the index returned any.
    pub text: Option<String>,
}

/// A document held by the search index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexedDocument {
    pub document_id: String,
    pub created: Option<String>,
    pub file_type: Option<String>,
    pub size: Option<u64>,
}

/// Decoding strategy for generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodingMethod {
    Greedy,
    Sample,
}

/// Generation parameters sent with each prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub decoding_method: DecodingMethod,
    pub max_new_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            decoding_method: DecodingMethod::Greedy,
            max_new_tokens: 1000,
        }
    }
}

/// Document search collaborator.
#[async_trait]
pub trait DiscoveryGateway: Send + Sync {
    /// Run a natural-language query, returning at most `count` ranked results.
    async fn query(&self, text: &str, count: u32) -> Result<Vec<SearchResult>, GatewayError>;

    /// List every document in the index.
    async fn list_documents(&self) -> Result<Vec<IndexedDocument>, GatewayError>;
}

/// Text generation collaborator.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Generate completions for `prompt`, in the order the model returned them.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Vec<String>, GatewayError>;
}

/// Reject anything that is not an absolute `http`/`https` URL.
pub(crate) fn check_base_url(raw: &str) -> Result<(), GatewayError> {
    match reqwest::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        Ok(_) => Err(GatewayError::NotConfigured(format!("not an HTTP URL: {}", raw))),
        Err(e) => Err(GatewayError::NotConfigured(format!("invalid URL {:?}: {}", raw, e))),
    }
}

/// Read a response body as an [`GatewayError::ApiError`] for non-success statuses.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(GatewayError::ApiError {
        status: status.as_u16(),
        message,
    })
}
