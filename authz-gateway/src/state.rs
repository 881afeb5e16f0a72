use crate::config::{timeout_from_secs, GatewayConfig};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;

/// Errors that prevent the application state from being built
#[derive(Debug, Error)]
pub enum StateError {
    #[error("{0}")]
    InvalidTimeout(String),
    #[error("Failed to create policy engine client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub opa_client: Arc<Client>,
}

impl AppState {
    /// Client used for every call to the policy engine.
    ///
    /// A request timeout is only applied when one is configured; otherwise the
    /// transport defaults decide how long a call may take.
    fn create_opa_client(query_timeout: Option<f64>) -> Result<Client, StateError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = query_timeout {
            let timeout =
                timeout_from_secs("query timeout", timeout).map_err(StateError::InvalidTimeout)?;
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }

    pub fn new(config: &GatewayConfig) -> Result<Self, StateError> {
        Ok(Self {
            config: Arc::new(config.clone()),
            opa_client: Arc::new(Self::create_opa_client(config.opa.query_timeout)?),
        })
    }

    #[cfg(test)]
    pub fn for_testing(config: &GatewayConfig) -> Self {
        Self::new(config).expect("Failed to create OPA client")
    }
}
