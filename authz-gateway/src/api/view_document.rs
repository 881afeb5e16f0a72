use crate::config::RequestValidation;
use crate::errors::MalformedRequest;
use crate::opa_client::authz::{query_view_document, AuthorizationQuery};
use crate::openapi::AUTHZ_TAG;
use crate::outcome::{AccessOutcome, ViewDocumentResponse};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    response::{IntoResponse, Response},
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

pub(super) fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(view_document_handler))
}

/// Request body of the view document endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ViewDocumentRequest {
    /// The user asking to view the document
    pub user: String,
}

impl TryFrom<Value> for ViewDocumentRequest {
    type Error = MalformedRequest;

    fn try_from(body: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut fields) = body else {
            return Err(MalformedRequest::NotAnObject);
        };
        match fields.remove("user") {
            Some(Value::String(user)) => Ok(Self { user }),
            Some(_) => Err(MalformedRequest::InvalidUser),
            None => Err(MalformedRequest::MissingUser),
        }
    }
}

impl From<ViewDocumentRequest> for AuthorizationQuery {
    fn from(request: ViewDocumentRequest) -> Self {
        AuthorizationQuery::view_document(Some(Value::String(request.user)))
    }
}

/// Whether the request declares a JSON body (`application/json` or a `+json` suffix)
fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.split_once('/') {
        Some(("application", subtype)) => subtype == "json" || subtype.ends_with("+json"),
        _ => false,
    }
}

/// Decode the raw inbound body.
///
/// Permissive mode treats a body without a JSON content type, or an empty one,
/// as an empty object; only a declared JSON body that fails to parse is rejected.
fn parse_body(
    headers: &HeaderMap,
    body: &[u8],
    validation: RequestValidation,
) -> Result<Value, MalformedRequest> {
    let is_json = has_json_content_type(headers);
    match validation {
        RequestValidation::Strict if !is_json => Err(MalformedRequest::UnsupportedContentType),
        RequestValidation::Permissive if !is_json || body.trim_ascii().is_empty() => {
            Ok(Value::Object(Default::default()))
        }
        _ => serde_json::from_slice(body)
            .map_err(|e| MalformedRequest::InvalidJson(e.to_string())),
    }
}

/// Label for the user in log lines: the JSON value itself, not its Rust debug form
fn user_label(user: Option<&Value>) -> String {
    match user {
        Some(Value::String(user)) => user.clone(),
        Some(other) => other.to_string(),
        None => "<none>".to_string(),
    }
}

/// Build the policy query from an inbound body according to the validation mode
fn build_query(
    body: Value,
    validation: RequestValidation,
) -> Result<AuthorizationQuery, MalformedRequest> {
    match validation {
        RequestValidation::Strict => Ok(ViewDocumentRequest::try_from(body)?.into()),
        RequestValidation::Permissive => Ok(AuthorizationQuery::view_document(
            body.get("user").cloned(),
        )),
    }
}

#[utoipa::path(
    post,
    path = "/view_document",
    tag = AUTHZ_TAG,
    request_body = ViewDocumentRequest,
    responses(
        (status = 200, description = "Access granted", body = ViewDocumentResponse),
        (status = 400, description = "Malformed request", body = ViewDocumentResponse),
        (status = 403, description = "Access denied", body = ViewDocumentResponse),
        (status = 500, description = "Policy engine failure", body = ViewDocumentResponse)
    )
)]
pub async fn view_document_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let validation = state.config.request_validation;
    let query = match parse_body(&headers, &body, validation)
        .and_then(|body| build_query(body, validation))
    {
        Ok(query) => query,
        Err(err) => {
            warn!("Rejecting view document request: {err}");
            return err.into_response();
        }
    };

    let outcome = AccessOutcome::from(query_view_document(&state, &query).await);
    match &outcome {
        AccessOutcome::Allowed => {
            info!("Access granted for user {}", user_label(query.user.as_ref()))
        }
        AccessOutcome::Denied => {
            info!("Access denied for user {}", user_label(query.user.as_ref()))
        }
        AccessOutcome::Failed(reason) => error!("Failed to query policy engine: {reason}"),
    }
    outcome.render(state.config.expose_upstream_errors)
}
