use crate::config::timeout_from_secs;
use serde::Deserialize;
use url::Url;

/// Configuration for the policy engine (OPA data API)
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OpaConfig {
    /// Base URL of the policy engine, e.g. http://localhost:8181 (required)
    pub url: String,

    /// Path of the decision document queried for every request (default: /v1/data/example/authz)
    pub policy_path: String,

    /// Timeout for policy queries in seconds (default: none, transport defaults apply)
    pub query_timeout: Option<f64>,
}

impl Default for OpaConfig {
    fn default() -> Self {
        Self {
            url: "".to_string(),
            policy_path: "/v1/data/example/authz".to_string(),
            query_timeout: None,
        }
    }
}

impl OpaConfig {
    /// Check that the policy engine address is usable
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("policy engine URL is required (set GATEWAY_OPA__URL)".to_string());
        }
        let parsed = Url::parse(&self.url)
            .map_err(|e| format!("invalid policy engine URL '{}': {}", self.url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!(
                "policy engine URL must use http or https, got '{}'",
                parsed.scheme()
            ));
        }
        if !self.policy_path.starts_with('/') {
            return Err(format!(
                "policy path must start with '/', got '{}'",
                self.policy_path
            ));
        }
        if let Some(timeout) = self.query_timeout {
            timeout_from_secs("query timeout", timeout)?;
        }
        Ok(())
    }

    /// Build the full URL for a path on the policy engine
    pub fn get_url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/{}", self.url.trim_end_matches('/'), path)
    }

    /// Full URL of the decision document
    pub fn policy_url(&self) -> String {
        self.get_url(&self.policy_path)
    }
}
