pub mod chat;
pub mod documents;

pub use chat::{ChatRequest, ChatResponse, DEFAULT_DOCUMENT_NAME};
pub use documents::{
    DocumentListResponse, DocumentMetadata, DocumentSummary, DocumentsErrorResponse,
};

/// Current time as fractional epoch seconds.
pub fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
