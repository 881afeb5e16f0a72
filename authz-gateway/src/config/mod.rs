use crate::config::opa::OpaConfig;
use config::{Config as ConfigCrate, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

pub mod opa;

/// Prefix of the environment variables read by the gateway
const ENV_PREFIX: &str = "GATEWAY";

/// Convert a timeout given in seconds, rejecting values a `Duration` cannot hold
pub fn timeout_from_secs(name: &str, secs: f64) -> Result<Duration, String> {
    match Duration::try_from_secs_f64(secs) {
        Ok(timeout) if !timeout.is_zero() => Ok(timeout),
        Ok(_) => Err(format!("{name} must be positive, got {secs}")),
        Err(e) => Err(format!("invalid {name} {secs}: {e}")),
    }
}

/// How strictly the inbound `/view_document` body is checked
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestValidation {
    /// The body must be an object with a string `user` field
    #[default]
    Strict,
    /// Any JSON body is accepted and `user` is forwarded as is (or omitted when absent)
    Permissive,
}

/// Main configuration structure for the gateway
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    /// The port the gateway listens on (default: 3000, `PORT` takes precedence)
    pub port: u16,

    /// Validation applied to inbound requests (default: strict)
    pub request_validation: RequestValidation,

    /// Include the raw upstream error text in 500 responses (default: true)
    pub expose_upstream_errors: bool,

    /// Timeout for the readiness probe against the policy engine, in seconds (default: 3)
    pub healthcheck_timeout: f64,

    /// Policy engine configuration
    pub opa: OpaConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            request_validation: RequestValidation::Strict,
            expose_upstream_errors: true,
            healthcheck_timeout: 3.0,
            opa: OpaConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Creates a new Config instance from environment variables
    pub fn new() -> Result<Self, String> {
        Self::load(
            Environment::with_prefix(ENV_PREFIX),
            std::env::var("PORT").ok(),
        )
    }

    fn load(environment: Environment, port: Option<String>) -> Result<Self, String> {
        let config: Self = ConfigCrate::builder()
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("port", port)
            .map_err(|e: ConfigError| e.to_string())?
            .build()
            .map_err(|e: ConfigError| e.to_string())?
            .try_deserialize()
            .map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Check the loaded values before the server starts
    pub fn validate(&self) -> Result<(), String> {
        timeout_from_secs("healthcheck timeout", self.healthcheck_timeout)?;
        self.opa.validate()
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(opa_mock: &wiremock::MockServer) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            healthcheck_timeout: 1.0,
            opa: OpaConfig {
                url: opa_mock.uri(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
