use crate::dtos::{epoch_seconds, ChatRequest, ChatResponse};
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;
use service_core::extract::MessageJson;

/// `POST /api/chat`
///
/// Hosted-service failures never surface here: the orchestrator degrades them
/// to a keyword answer, so this path answers 200 unless the request is invalid.
pub async fn chat(
    State(state): State<AppState>,
    MessageJson(req): MessageJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let document = req.document_name().to_string();

    tracing::info!(
        document = %document,
        message_len = req.message.len(),
        "Received chat message"
    );

    let outcome = state.orchestrator.run(&req.message, &document).await;
    tracing::info!(outcome = outcome.label(), "Chat answered");

    Ok(Json(ChatResponse {
        response: outcome.into_text(),
        document,
        timestamp: epoch_seconds(),
    }))
}
