use crate::config::timeout_from_secs;
use crate::openapi::HEALTH_TAG;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::warn;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Represents the health status of a component or the overall service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum HealthStatusType {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "error")]
    Error,
}

/// Status of an individual component
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    pub status: HealthStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health status of the gateway's dependencies
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub opa: ComponentStatus,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<ComponentHealth>,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status_code = match self.status {
            HealthStatusType::Ok => StatusCode::OK,
            HealthStatusType::Error => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status_code, Json(self)).into_response()
    }
}

/// Probe the policy engine's own health endpoint, bounded by the configured timeout
async fn check_opa_health(state: &AppState) -> ComponentStatus {
    let timeout_secs = state.config.healthcheck_timeout;
    let probe_timeout = match timeout_from_secs("healthcheck timeout", timeout_secs) {
        Ok(probe_timeout) => probe_timeout,
        Err(error) => {
            return ComponentStatus {
                status: HealthStatusType::Error,
                error: Some(error),
            }
        }
    };

    let opa_url = state.config.opa.get_url("/health");
    let probe = state.opa_client.get(&opa_url).send();
    match timeout(probe_timeout, probe).await {
        Ok(Ok(response)) if response.status().is_success() => ComponentStatus {
            status: HealthStatusType::Ok,
            error: None,
        },
        Ok(Ok(response)) => ComponentStatus {
            status: HealthStatusType::Error,
            error: Some(format!("OPA returned status {}", response.status())),
        },
        Ok(Err(err)) => ComponentStatus {
            status: HealthStatusType::Error,
            error: Some(format!("Failed to connect to OPA: {}", err)),
        },
        Err(_) => ComponentStatus {
            status: HealthStatusType::Error,
            error: Some(format!(
                "OPA health check timed out after {} seconds",
                timeout_secs
            )),
        },
    }
}

/// Liveness check handler
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health_check() -> HealthResponse {
    HealthResponse {
        status: HealthStatusType::Ok,
        components: None,
    }
}

/// Readiness check handler
#[utoipa::path(
    get,
    path = "/ready",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Policy engine is reachable", body = HealthResponse),
        (status = 503, description = "Policy engine is not reachable", body = HealthResponse)
    )
)]
pub async fn ready_check(State(state): State<AppState>) -> HealthResponse {
    let opa = check_opa_health(&state).await;
    if let Some(error) = &opa.error {
        warn!("Readiness check failed: {error}");
    }
    HealthResponse {
        status: opa.status,
        components: Some(ComponentHealth { opa }),
    }
}

pub(super) fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(ready_check))
}
