//! Request body extraction for the chat-style JSON endpoints.
//!
//! Both services accept a JSON object carrying a `message` field and share
//! the same rejection rules:
//! - no body, unparseable JSON, a non-object or an empty object is rejected
//!   with `No data provided`;
//! - field-level validation failures surface their own message
//!   (e.g. `Empty message`).

use crate::error::AppError;
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

pub const NO_DATA_PROVIDED: &str = "No data provided";
pub const EMPTY_MESSAGE: &str = "Empty message";

/// Validated JSON object body.
#[derive(Debug, Clone)]
pub struct MessageJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for MessageJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| AppError::bad_request(NO_DATA_PROVIDED))?;

        let payload: T = parse_object(&bytes)?;
        payload.validate()?;

        Ok(MessageJson(payload))
    }
}

fn parse_object<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|_| AppError::bad_request(NO_DATA_PROVIDED))?;

    match &value {
        serde_json::Value::Object(map) if !map.is_empty() => {}
        _ => return Err(AppError::bad_request(NO_DATA_PROVIDED)),
    }

    serde_json::from_value(value).map_err(|e| {
        tracing::debug!(error = %e, "Request body has unexpected shape");
        AppError::bad_request("Invalid request body")
    })
}

/// Rejects strings that are empty after trimming whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed(EMPTY_MESSAGE));
        return Err(err);
    }
    Ok(())
}

/// Deserializes a missing or `null` string as the empty string.
pub fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[serde(default, deserialize_with = "null_as_empty")]
        #[validate(custom(function = "validate_not_blank"))]
        message: String,
    }

    async fn extract(body: &'static str) -> Result<Payload, String> {
        let req = Request::builder()
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        match MessageJson::<Payload>::from_request(req, &()).await {
            Ok(MessageJson(p)) => Ok(p),
            Err(AppError::BadRequest(e)) => Err(e.to_string()),
            Err(AppError::ValidationError(_)) => Err(EMPTY_MESSAGE.to_string()),
            Err(other) => Err(format!("unexpected: {other}")),
        }
    }

    #[tokio::test]
    async fn empty_body_is_no_data() {
        assert_eq!(extract("").await.unwrap_err(), NO_DATA_PROVIDED);
    }

    #[tokio::test]
    async fn empty_object_is_no_data() {
        assert_eq!(extract("{}").await.unwrap_err(), NO_DATA_PROVIDED);
    }

    #[tokio::test]
    async fn malformed_json_is_no_data() {
        assert_eq!(extract("{not json").await.unwrap_err(), NO_DATA_PROVIDED);
    }

    #[tokio::test]
    async fn array_body_is_no_data() {
        assert_eq!(extract("[1, 2]").await.unwrap_err(), NO_DATA_PROVIDED);
    }

    #[tokio::test]
    async fn missing_message_is_empty_message() {
        assert_eq!(
            extract(r#"{"document_name": "a.pdf"}"#).await.unwrap_err(),
            EMPTY_MESSAGE
        );
    }

    #[tokio::test]
    async fn null_message_is_empty_message() {
        assert_eq!(extract(r#"{"message": null}"#).await.unwrap_err(), EMPTY_MESSAGE);
    }

    #[tokio::test]
    async fn whitespace_message_is_empty_message() {
        assert_eq!(
            extract(r#"{"message": "  \t\n "}"#).await.unwrap_err(),
            EMPTY_MESSAGE
        );
    }

    #[tokio::test]
    async fn non_string_message_is_rejected() {
        assert_eq!(
            extract(r#"{"message": 42}"#).await.unwrap_err(),
            "Invalid request body"
        );
    }

    #[tokio::test]
    async fn valid_message_is_kept_verbatim() {
        let payload = extract(r#"{"message": "  hi  "}"#).await.unwrap();
        assert_eq!(payload.message, "  hi  ");
    }

    #[test]
    fn not_blank_carries_message() {
        let err = validate_not_blank(" ").unwrap_err();
        assert_eq!(err.message.as_deref(), Some(EMPTY_MESSAGE));
    }
}
