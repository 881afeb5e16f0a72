use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

pub(crate) const MALFORMED_REQUEST: &str = "Malformed request";

/// The inbound body could not be turned into an authorization query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRequest {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("expected a request with 'Content-Type: application/json'")]
    UnsupportedContentType,
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("missing required field 'user'")]
    MissingUser,
    #[error("field 'user' must be a string")]
    InvalidUser,
}

impl IntoResponse for MalformedRequest {
    fn into_response(self) -> axum::response::Response {
        let body = json!({
            "message": MALFORMED_REQUEST,
            "error": self.to_string(),
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}
