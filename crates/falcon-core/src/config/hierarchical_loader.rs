//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Runtime config (~/.falcon/falcon-runtime.yaml, or an explicit path)
//! 3. Environment variables (FALCON_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{FalconConfig, RuntimeConfig};
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use serde_yaml_ng::Value;
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Name of the runtime config file inside the config directory
pub const RUNTIME_CONFIG_FILE: &str = "falcon-runtime.yaml";

/// Runtime config read from a file, with the settings it spells out
struct RuntimeOverlay {
    config: RuntimeConfig,
    sets_cloud: bool,
    sets_network: bool,
    sets_reconcile: bool,
}

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a loader rooted at the standard config directory (~/.falcon)
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the standard config directory (~/.falcon)
    ///
    /// HOME wins over the passwd entry so containers with a remapped home behave.
    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = env::var("HOME")
            .ok()
            .map(Utf8PathBuf::from)
            .or_else(|| dirs::home_dir().and_then(|p| Utf8PathBuf::from_path_buf(p).ok()))
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;

        Ok(home.join(".falcon"))
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        self.load_runtime_config_from(None)
    }

    /// Load runtime configuration, reading `path` instead of the default file
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load_runtime_config_from(&self, path: Option<&Utf8Path>) -> Result<RuntimeConfig> {
        let mut config = Self::load_embedded_config::<RuntimeConfig>("runtime-defaults.yaml")?;

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::config_not_found(path.as_str()));
                }
                let overlay = self.load_overlay(path)?;
                config = Self::merge_runtime_config(config, overlay);
            }
            None => {
                let runtime_config_path = self.config_dir.join(RUNTIME_CONFIG_FILE);
                if runtime_config_path.exists() {
                    let overlay = self.load_overlay(&runtime_config_path)?;
                    config = Self::merge_runtime_config(config, overlay);
                }
            }
        }

        Self::apply_env_overrides(config)
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })
    }

    /// Load a runtime config file, remembering which settings it spells out
    fn load_overlay(&self, path: &Utf8Path) -> Result<RuntimeOverlay> {
        debug!(path = %path, "Loading runtime config file");
        let content = fs::read_to_string(path)?;
        let value: Value = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;

        let sets_cloud = value
            .get("falcon")
            .and_then(|falcon| falcon.get("cloud"))
            .is_some();
        let sets_network = value.get("network").is_some();
        let sets_reconcile = value.get("reconcile").is_some();

        // An empty file parses as null
        let config = if value.is_null() {
            RuntimeConfig::default()
        } else {
            serde_yaml_ng::from_value(value)
                .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?
        };

        Ok(RuntimeOverlay {
            config,
            sets_cloud,
            sets_network,
            sets_reconcile,
        })
    }

    /// Merge a file overlay into the base config
    ///
    /// Settings absent from the file keep the base value instead of the serde default.
    fn merge_runtime_config(base: RuntimeConfig, overlay: RuntimeOverlay) -> RuntimeConfig {
        let RuntimeOverlay {
            config,
            sets_cloud,
            sets_network,
            sets_reconcile,
        } = overlay;

        let mut falcon = Self::merge_falcon_config(base.falcon.clone(), config.falcon);
        if !sets_cloud {
            falcon.cloud = base.falcon.cloud;
        }

        RuntimeConfig {
            falcon,
            network: if sets_network {
                config.network
            } else {
                base.network
            },
            reconcile: if sets_reconcile {
                config.reconcile
            } else {
                base.reconcile
            },
        }
    }

    /// Credentials and overrides are merged field by field
    fn merge_falcon_config(base: FalconConfig, overlay: FalconConfig) -> FalconConfig {
        FalconConfig {
            cloud: overlay.cloud,
            client_id: overlay.client_id.or(base.client_id),
            client_secret: overlay.client_secret.or(base.client_secret),
            cid: overlay.cid.or(base.cid),
            api_url: overlay.api_url.or(base.api_url),
            registry_url: overlay.registry_url.or(base.registry_url),
        }
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("FALCON_CLOUD") {
            config.falcon.cloud = val.parse()?;
        }

        if let Ok(val) = env::var("FALCON_CLIENT_ID") {
            config.falcon.client_id = Some(val);
        }

        if let Ok(val) = env::var("FALCON_CLIENT_SECRET") {
            config.falcon.client_secret = Some(val);
        }

        if let Ok(val) = env::var("FALCON_CID") {
            config.falcon.cid = Some(val);
        }

        if let Ok(val) = env::var("FALCON_API_URL") {
            config.falcon.api_url = Some(val);
        }

        if let Ok(val) = env::var("FALCON_REGISTRY_URL") {
            config.falcon.registry_url = Some(val);
        }

        if let Ok(val) = env::var("FALCON_HTTP_TIMEOUT_SECS") {
            config.network.http_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("FALCON_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("FALCON_REQUEUE_DELAY_SECS") {
            config.reconcile.requeue_delay_secs = val.parse().map_err(|_| {
                Error::invalid_config("FALCON_REQUEUE_DELAY_SECS must be a valid number")
            })?;
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
