use crate::opa_client::authz::AuthorizationResult;
use crate::opa_client::ForwardingError;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub(crate) const ACCESS_GRANTED: &str = "Access granted";
pub(crate) const ACCESS_DENIED: &str = "Access denied";
pub(crate) const INTERNAL_SERVER_ERROR: &str = "Internal server error";
/// Replaces the upstream error text when it must not reach the caller
pub(crate) const REDACTED_UPSTREAM_ERROR: &str = "policy engine request failed";

/// Result of one authorization exchange with the policy engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    Allowed,
    Denied,
    Failed(String),
}

impl From<Result<AuthorizationResult, ForwardingError>> for AccessOutcome {
    fn from(result: Result<AuthorizationResult, ForwardingError>) -> Self {
        match result {
            Ok(AuthorizationResult { allowed: true }) => Self::Allowed,
            Ok(AuthorizationResult { allowed: false }) => Self::Denied,
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}

/// Body of every `/view_document` response
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ViewDocumentResponse {
    /// Human readable outcome
    pub message: String,
    /// Failure description, only present on errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AccessOutcome {
    /// Map the outcome to the status and body returned to the caller.
    ///
    /// With `expose_errors` unset the upstream error text is replaced by a
    /// generic description.
    pub fn into_parts(self, expose_errors: bool) -> (StatusCode, ViewDocumentResponse) {
        match self {
            Self::Allowed => (
                StatusCode::OK,
                ViewDocumentResponse {
                    message: ACCESS_GRANTED.to_string(),
                    error: None,
                },
            ),
            Self::Denied => (
                StatusCode::FORBIDDEN,
                ViewDocumentResponse {
                    message: ACCESS_DENIED.to_string(),
                    error: None,
                },
            ),
            Self::Failed(reason) => {
                let error = if expose_errors && !reason.is_empty() {
                    reason
                } else {
                    REDACTED_UPSTREAM_ERROR.to_string()
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ViewDocumentResponse {
                        message: INTERNAL_SERVER_ERROR.to_string(),
                        error: Some(error),
                    },
                )
            }
        }
    }

    pub fn render(self, expose_errors: bool) -> Response {
        let (status, body) = self.into_parts(expose_errors);
        (status, Json(body)).into_response()
    }
}
