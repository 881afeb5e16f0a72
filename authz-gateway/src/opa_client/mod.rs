use crate::state::AppState;
use axum::http::StatusCode;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// Reexport modules
pub mod authz;

/// Generic function to send a request to OPA and return the `result` of the decision document
async fn send_request_to_opa<R: DeserializeOwned + Default, B: Serialize>(
    state: &AppState,
    endpoint: &str,
    body: &B,
) -> Result<R, ForwardingError> {
    let request = OpaRequest { input: body };
    let response: OpaResponse<R> = send_raw_request_to_opa(state, endpoint, &request).await?;
    Ok(response.result)
}

/// Generic function to forward requests to OPA
async fn send_raw_request_to_opa<B: Serialize, R: DeserializeOwned + Default>(
    state: &AppState,
    endpoint: &str,
    body: &OpaRequest<B>,
) -> Result<OpaResponse<R>, ForwardingError> {
    let opa_url = state.config.opa.get_url(endpoint);
    debug!("Forwarding request to OPA at: {}", opa_url);

    let response = state.opa_client.post(&opa_url).json(body).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        return Err(ForwardingError::InvalidStatus(status));
    }

    // OPA always answers with an object; anything else is not a decision document
    let body = response.bytes().await?;
    match serde_json::from_slice::<Value>(&body)? {
        value @ Value::Object(_) => Ok(serde_json::from_value(value)?),
        other => Err(ForwardingError::UnexpectedShape(json_type_name(&other))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A generic wrapper for OPA requests, wrapping the input data.
/// https://www.openpolicyagent.org/docs/latest/integration/#named-policy-decisions
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OpaRequest<T> {
    pub input: T,
}

/// A generic wrapper for OPA responses, wrapping the result data.
///
/// OPA omits `result` when the decision is undefined, so the field falls back
/// to the type's default.
/// https://www.openpolicyagent.org/docs/latest/integration/#named-policy-decisions
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OpaResponse<T> {
    #[serde(default)]
    pub result: T,
}

/// Errors that can occur when forwarding requests to OPA
#[derive(Debug, Error)]
pub enum ForwardingError {
    #[error("Failed to send request to OPA: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("OPA request failed with status: {0}")]
    InvalidStatus(StatusCode),
    #[error("Failed to parse OPA response: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Unexpected OPA response: expected an object, got {0}")]
    UnexpectedShape(&'static str),
}
