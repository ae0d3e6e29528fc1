//! Sensor update policy resolution
//!
//! An update policy is owned by the Falcon management system. This module
//! only reads it: the policy name is looked up, its details fetched, and the
//! sensor version for the node architecture reduced to `MAJOR.MINOR`.

use crate::error::{ImageError, Result};
use crate::filter::Filter;
use async_trait::async_trait;
use falcon_core::Architecture;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Platform every sensor update policy handled here belongs to
pub const POLICY_PLATFORM: &str = "Linux";

/// Read-only capability over the management API's update policy endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PolicyApi: Send + Sync {
    /// Query policy identifiers matching `filter`
    async fn query_policy_ids(&self, filter: &Filter) -> Result<Vec<String>>;

    /// Fetch full policy details for `ids`
    async fn policy_details(&self, ids: &[String]) -> Result<Vec<UpdatePolicy>>;
}

/// Sensor update policy as returned by the management API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePolicy {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub enabled: bool,
    #[serde(default)]
    pub settings: UpdatePolicySettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePolicySettings {
    /// Version applied when no per-architecture variant is declared
    #[serde(default)]
    pub sensor_version: Option<String>,
    #[serde(default)]
    pub variants: Vec<PolicyVariant>,
}

/// Per-architecture sensor version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVariant {
    #[serde(alias = "platform")]
    pub architecture: String,
    #[serde(default)]
    pub sensor_version: Option<String>,
}

impl UpdatePolicy {
    pub fn default_sensor_version(&self) -> Option<&str> {
        non_empty(self.settings.sensor_version.as_deref())
    }

    /// Sensor version that applies to `architecture`
    ///
    /// Declared variants take over completely: an architecture without a
    /// variant has no version even if a default is set.
    pub fn sensor_version_for(&self, architecture: &Architecture) -> Option<&str> {
        if self.settings.variants.is_empty() {
            return self.default_sensor_version();
        }

        self.settings
            .variants
            .iter()
            .find(|v| v.architecture == architecture.as_str())
            .and_then(|v| non_empty(v.sensor_version.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Filter selecting a Linux sensor update policy by its exact name
pub fn policy_filter(policy_name: &str) -> Filter {
    Filter::new()
        .add_clause("platform_name", POLICY_PLATFORM)
        .add_clause("name.raw", policy_name)
}

/// Reduce a `MAJOR.MINOR.PATCH` sensor version to `MAJOR.MINOR`
///
/// Returns `None` unless the input has exactly three numeric segments.
pub fn major_minor(version: &str) -> Option<String> {
    let segments: Vec<&str> = version.split('.').collect();
    if segments.len() != 3 {
        return None;
    }
    if !segments
        .iter()
        .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }
    Some(format!("{}.{}", segments[0], segments[1]))
}

/// Resolves a named update policy to the `MAJOR.MINOR` sensor version it pins
pub struct UpdatePolicyResolver<'a> {
    api: &'a dyn PolicyApi,
}

impl<'a> UpdatePolicyResolver<'a> {
    pub fn new(api: &'a dyn PolicyApi) -> Self {
        Self { api }
    }

    /// Resolve `policy_name` to a `MAJOR.MINOR` version for `architecture`
    pub async fn resolve_version(
        &self,
        policy_name: &str,
        architecture: &Architecture,
    ) -> Result<String> {
        let filter = policy_filter(policy_name);
        debug!(policy = policy_name, filter = %filter, "Querying sensor update policy");

        let ids = self.api.query_policy_ids(&filter).await?;
        let id = ids.first().ok_or_else(|| ImageError::PolicyNotFound {
            name: policy_name.to_string(),
        })?;
        trace!(policy = policy_name, id = %id, matches = ids.len(), "Policy query matched");

        let details = self.api.policy_details(std::slice::from_ref(id)).await?;
        let policy = details
            .into_iter()
            .next()
            .ok_or_else(|| ImageError::PolicyIdNotFound { id: id.clone() })?;

        if !policy.enabled {
            return Err(ImageError::PolicyDisabled { id: policy.id });
        }

        let version = policy.sensor_version_for(architecture).ok_or_else(|| {
            ImageError::NoVersionForArchitecture {
                id: policy.id.clone(),
                architecture: architecture.to_string(),
            }
        })?;

        let resolved = major_minor(version).ok_or_else(|| ImageError::InvalidSensorVersion {
            id: policy.id.clone(),
            version: version.to_string(),
        })?;

        debug!(
            policy = policy_name,
            id = %policy.id,
            architecture = %architecture,
            version = %resolved,
            "Resolved update policy version"
        );
        Ok(resolved)
    }
}
