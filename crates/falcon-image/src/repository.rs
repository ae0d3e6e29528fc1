//! Sensor image repository
//!
//! Picks the tag to deploy for a sensor. The target version comes from, in
//! order of precedence:
//! 1. An explicit version from the sensor resource (no remote call)
//! 2. A named update policy, resolved through the management API
//! 3. Nothing, meaning the latest published tag
//!
//! The registry is then listed and the matching tag selected. Errors are
//! returned as-is; backoff and requeueing belong to the caller.

use crate::arch::{ArchitectureProbe, HostArchitecture};
use crate::error::Result;
use crate::policy::{PolicyApi, UpdatePolicyResolver};
use crate::registry::{RepositoryReference, TagRegistry};
use crate::selector::{select_tag, TagPredicate};
use falcon_core::{CloudRegion, SensorType};
use std::sync::Arc;
use tracing::debug;

/// Tag chosen for a sensor, with the repository it was found in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub repository: RepositoryReference,
    pub tag: String,
}

impl ResolvedImage {
    /// Full image reference (`registry/path:tag`)
    pub fn image(&self) -> String {
        self.repository.image(&self.tag)
    }
}

pub struct ImageRepository {
    api: Arc<dyn PolicyApi>,
    registry: Arc<dyn TagRegistry>,
    probe: Arc<dyn ArchitectureProbe>,
    cloud: CloudRegion,
}

impl ImageRepository {
    /// Create a repository probing the host architecture
    pub fn new(api: Arc<dyn PolicyApi>, registry: Arc<dyn TagRegistry>, cloud: CloudRegion) -> Self {
        Self {
            api,
            registry,
            probe: Arc::new(HostArchitecture),
            cloud,
        }
    }

    /// Replace the architecture probe
    pub fn with_probe(mut self, probe: Arc<dyn ArchitectureProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Version prefix to filter tags with; `None` selects the latest tag
    pub async fn target_version(
        &self,
        version_spec: Option<&str>,
        update_policy: Option<&str>,
    ) -> Result<Option<String>> {
        if let Some(version) = version_spec.filter(|v| !v.is_empty()) {
            debug!(version, "Using explicit sensor version");
            return Ok(Some(version.to_string()));
        }

        if let Some(policy) = update_policy.filter(|p| !p.is_empty()) {
            let architecture = self.probe.architecture();
            let version = UpdatePolicyResolver::new(self.api.as_ref())
                .resolve_version(policy, &architecture)
                .await?;
            return Ok(Some(version));
        }

        Ok(None)
    }

    /// Resolve the image to deploy for `sensor_type`
    pub async fn preferred_image(
        &self,
        sensor_type: SensorType,
        version_spec: Option<&str>,
        update_policy: Option<&str>,
    ) -> Result<ResolvedImage> {
        let version = self.target_version(version_spec, update_policy).await?;

        let repository = self.registry.repository(sensor_type);
        let tags = self.registry.list_tags(&repository).await?;
        debug!(
            sensor = %sensor_type,
            repository = %repository,
            version = version.as_deref().unwrap_or("latest"),
            count = tags.len(),
            "Selecting sensor tag"
        );

        let predicate = TagPredicate::new(sensor_type, self.cloud, version.as_deref());
        let tag = select_tag(
            tags,
            |tag| predicate.matches(tag),
            sensor_type,
            &repository.to_string(),
        )?;

        Ok(ResolvedImage { repository, tag })
    }

    async fn preferred_tag(
        &self,
        sensor_type: SensorType,
        version_spec: Option<&str>,
        update_policy: Option<&str>,
    ) -> Result<String> {
        self.preferred_image(sensor_type, version_spec, update_policy)
            .await
            .map(|image| image.tag)
    }

    pub async fn node_sensor_tag(
        &self,
        version_spec: Option<&str>,
        update_policy: Option<&str>,
    ) -> Result<String> {
        self.preferred_tag(SensorType::Node, version_spec, update_policy)
            .await
    }

    pub async fn sidecar_sensor_tag(
        &self,
        version_spec: Option<&str>,
        update_policy: Option<&str>,
    ) -> Result<String> {
        self.preferred_tag(SensorType::Sidecar, version_spec, update_policy)
            .await
    }

    pub async fn regioned_sidecar_sensor_tag(
        &self,
        version_spec: Option<&str>,
        update_policy: Option<&str>,
    ) -> Result<String> {
        self.preferred_tag(SensorType::RegionedSidecar, version_spec, update_policy)
            .await
    }

    pub async fn admission_sensor_tag(
        &self,
        version_spec: Option<&str>,
        update_policy: Option<&str>,
    ) -> Result<String> {
        self.preferred_tag(SensorType::Admission, version_spec, update_policy)
            .await
    }

    pub async fn image_analyzer_tag(
        &self,
        version_spec: Option<&str>,
        update_policy: Option<&str>,
    ) -> Result<String> {
        self.preferred_tag(SensorType::ImageAnalyzer, version_spec, update_policy)
            .await
    }
}
