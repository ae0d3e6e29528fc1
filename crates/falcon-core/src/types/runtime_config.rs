//! Runtime configuration types for operational parameters
//!
//! These types define the Falcon API credentials, network settings and
//! the requeue behavior of the reconciling caller.

use super::sensor_types::CloudRegion;
use serde::{Deserialize, Serialize};

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Falcon cloud and API credentials
    #[serde(default)]
    pub falcon: FalconConfig,

    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Reconciliation behavior of the caller
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// Falcon cloud and API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FalconConfig {
    /// Cloud region hosting the tenant
    #[serde(default)]
    pub cloud: CloudRegion,

    /// OAuth2 client id
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth2 client secret
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Customer ID; looked up through the API when absent
    #[serde(default)]
    pub cid: Option<String>,

    /// Override for the management API base URL
    #[serde(default)]
    pub api_url: Option<String>,

    /// Override for the registry base URL (scheme included)
    #[serde(default)]
    pub registry_url: Option<String>,
}

impl FalconConfig {
    /// Management API base URL, honoring the override
    pub fn api_base_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| self.cloud.api_url().to_string())
    }

    /// Registry base URL, honoring the override
    pub fn registry_base_url(&self) -> String {
        self.registry_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.cloud.registry_host()))
    }
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Deadline for a whole image resolution, in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    120
}

fn default_user_agent() -> String {
    format!(
        "falcon-operator/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Reconciliation behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReconcileConfig {
    /// Fixed delay before a failed resolution is retried
    #[serde(default = "default_requeue_delay")]
    pub requeue_delay_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            requeue_delay_secs: default_requeue_delay(),
        }
    }
}

fn default_requeue_delay() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
falcon:
  cloud: eu-1
  client-id: abc
"#;
        let config: RuntimeConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.falcon.cloud, CloudRegion::Eu1);
        assert_eq!(config.falcon.client_id.as_deref(), Some("abc"));
        assert_eq!(config.network.http_timeout_secs, 120);
        assert_eq!(config.reconcile.requeue_delay_secs, 60);
        assert!(config.network.user_agent.starts_with("falcon-operator/"));
    }

    #[test]
    fn test_base_url_overrides() {
        let mut falcon = FalconConfig::default();
        assert_eq!(falcon.api_base_url(), "https://api.crowdstrike.com");
        assert_eq!(falcon.registry_base_url(), "https://registry.crowdstrike.com");

        falcon.api_url = Some("http://127.0.0.1:8080".to_string());
        falcon.registry_url = Some("http://127.0.0.1:5000".to_string());
        assert_eq!(falcon.api_base_url(), "http://127.0.0.1:8080");
        assert_eq!(falcon.registry_base_url(), "http://127.0.0.1:5000");
    }
}
