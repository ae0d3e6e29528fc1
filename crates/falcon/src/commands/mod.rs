//! CLI command implementations
//!
//! Commands that talk to Falcon share the helpers below: configuration is
//! loaded once per invocation and every client is built fresh from it.

pub mod policy;
pub mod resolve;
pub mod tags;
pub mod version;

use crate::cli::GlobalOptions;
use anyhow::{anyhow, Context, Result};
use falcon_core::{Architecture, HierarchicalConfigLoader, RuntimeConfig};
use falcon_image::{
    ApiCredentials, ArchitectureProbe, FalconApiClient, FixedArchitecture, HostArchitecture,
    RegistryClient, RegistryCredentials,
};
use std::sync::Arc;
use tracing::debug;

/// Load the runtime configuration and apply CLI overrides
pub(crate) fn load_config(global: &GlobalOptions) -> Result<RuntimeConfig> {
    let loader = HierarchicalConfigLoader::new()?;
    let mut config = loader
        .load_runtime_config_from(global.config.as_deref())
        .context("Failed to load runtime configuration")?;

    if let Some(cloud) = global.cloud {
        config.falcon.cloud = cloud;
    }

    debug!(cloud = %config.falcon.cloud, "Loaded runtime configuration");
    Ok(config)
}

/// Authenticate against the management API
pub(crate) async fn connect_api(config: &RuntimeConfig) -> Result<FalconApiClient> {
    let client_id = non_empty(config.falcon.client_id.as_deref()).ok_or_else(|| {
        anyhow!(
            "No Falcon API client id configured.\n\n\
             Set FALCON_CLIENT_ID or falcon.client-id in ~/.falcon/falcon-runtime.yaml"
        )
    })?;
    let client_secret = non_empty(config.falcon.client_secret.as_deref()).ok_or_else(|| {
        anyhow!(
            "No Falcon API client secret configured.\n\n\
             Set FALCON_CLIENT_SECRET or falcon.client-secret in ~/.falcon/falcon-runtime.yaml"
        )
    })?;

    let base_url = config.falcon.api_base_url();
    FalconApiClient::connect(
        &base_url,
        &ApiCredentials::new(client_id, client_secret),
        &config.network.user_agent,
    )
    .await
    .with_context(|| format!("Failed to authenticate with {}", base_url))
}

/// Build a registry client logged in as the tenant's customer
///
/// The CID comes from configuration when set, otherwise from the API.
pub(crate) async fn registry_client(
    config: &RuntimeConfig,
    api: &FalconApiClient,
) -> Result<RegistryClient> {
    let cid = match non_empty(config.falcon.cid.as_deref()) {
        Some(cid) => cid.to_string(),
        None => api
            .customer_id()
            .await
            .context("Failed to look up the customer ID")?,
    };
    let token = api
        .registry_token()
        .await
        .context("Failed to fetch registry credentials")?;

    let client = RegistryClient::with_base_url(
        config.falcon.cloud,
        &config.falcon.registry_base_url(),
        &config.network.user_agent,
    )?;
    Ok(client.with_credentials(RegistryCredentials::for_customer(&cid, token)))
}

/// Architecture probe honoring an `--arch` override
pub(crate) fn architecture_probe(arch: Option<&str>) -> Arc<dyn ArchitectureProbe> {
    match non_empty(arch) {
        Some(arch) => Arc::new(FixedArchitecture::new(Architecture::new(arch))),
        None => Arc::new(HostArchitecture),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
