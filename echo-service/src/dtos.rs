use serde::{Deserialize, Serialize};
use service_core::extract::{null_as_empty, validate_not_blank};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ProcessRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(custom(function = "validate_not_blank"))]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub response: String,
}
