use crate::dtos::{ProcessRequest, ProcessResponse};
use axum::Json;
use service_core::error::AppError;
use service_core::extract::MessageJson;

/// Canned acknowledgement for `message`; no processing happens.
pub fn acknowledge(message: &str) -> String {
    format!(
        "Hello! Unfortunately, the app is not yet smart enough to handle your requirements: {}. Sorry and Thank You for Your Patience.",
        message
    )
}

/// `POST /api/process`
pub async fn process_input(
    MessageJson(req): MessageJson<ProcessRequest>,
) -> Result<Json<ProcessResponse>, AppError> {
    tracing::info!(message = %req.message, "Received the message");

    Ok(Json(ProcessResponse {
        response: acknowledge(&req.message),
    }))
}
