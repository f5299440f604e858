use serde::{Deserialize, Serialize};
use service_core::extract::{null_as_empty, validate_not_blank};
use validator::Validate;

/// Document name used when the caller does not name one.
pub const DEFAULT_DOCUMENT_NAME: &str = "Unknown Document";

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(custom(function = "validate_not_blank"))]
    pub message: String,

    #[serde(default)]
    pub document_name: Option<String>,
}

impl ChatRequest {
    /// The named document, or the placeholder when absent or blank.
    pub fn document_name(&self) -> &str {
        self.document_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_DOCUMENT_NAME)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub document: String,
    pub timestamp: f64,
}
