use crate::dtos::{epoch_seconds, DocumentListResponse, DocumentSummary, DocumentsErrorResponse};
use crate::startup::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// `GET /api/documents`
///
/// Unlike chat, listing has no fallback: any failure is a 500 with an empty list.
pub async fn list_documents(State(state): State<AppState>) -> Response {
    let Some(discovery) = state.discovery.as_ref() else {
        tracing::warn!("Document listing requested but discovery is not configured");
        return error_response("Discovery service is not configured".to_string());
    };

    match discovery.list_documents().await {
        Ok(docs) => {
            let documents: Vec<DocumentSummary> =
                docs.into_iter().map(DocumentSummary::from).collect();

            tracing::info!(count = documents.len(), "Listed documents");

            Json(DocumentListResponse {
                count: documents.len(),
                documents,
                timestamp: epoch_seconds(),
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list documents");
            error_response(e.to_string())
        }
    }
}

fn error_response(error: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(DocumentsErrorResponse {
            error,
            documents: Vec::new(),
        }),
    )
        .into_response()
}
