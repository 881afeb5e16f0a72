use crate::opa_client::{send_request_to_opa, ForwardingError};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action checked by the `/view_document` endpoint
pub const VIEW_ACTION: &str = "view";
/// Resource checked by the `/view_document` endpoint
pub const DOCUMENT_RESOURCE: &str = "document";

/// Send a view-document query to OPA and interpret the decision
pub async fn query_view_document(
    state: &AppState,
    query: &AuthorizationQuery,
) -> Result<AuthorizationResult, ForwardingError> {
    let decision: Value =
        send_request_to_opa(state, &state.config.opa.policy_path, query).await?;
    Ok(AuthorizationResult::from_decision(&decision))
}

/// Authorization query sent to OPA as the `input` document
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuthorizationQuery {
    /// The subject, forwarded as received (omitted when the caller did not send one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    /// The action the user wants to perform
    pub action: String,
    /// The resource the user wants to access
    pub resource: String,
}

impl AuthorizationQuery {
    /// Query for viewing the document on behalf of `user`
    pub fn view_document(user: Option<Value>) -> Self {
        Self {
            user,
            action: VIEW_ACTION.to_string(),
            resource: DOCUMENT_RESOURCE.to_string(),
        }
    }
}

/// Decision returned by OPA
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationResult {
    /// Whether the action is allowed
    pub allowed: bool,
}

impl AuthorizationResult {
    /// Interpret the `result` of a decision document.
    ///
    /// An undefined decision (missing or null) denies. Non-boolean values follow
    /// the usual truthiness rules: zero, empty strings and null are false.
    pub fn from_decision(decision: &Value) -> Self {
        let allowed = match decision {
            Value::Null => false,
            Value::Bool(allowed) => *allowed,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        };
        Self { allowed }
    }
}
