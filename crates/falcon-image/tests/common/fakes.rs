//! In-memory implementations of the resolution seams
//!
//! Each fake counts its calls so tests can assert which remote services a
//! resolution touched.

use async_trait::async_trait;
use falcon_core::{CloudRegion, SensorType};
use falcon_image::policy::UpdatePolicySettings;
use falcon_image::{Filter, ImageError, PolicyApi, RepositoryReference, TagRegistry, UpdatePolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Policy API holding at most one policy
#[derive(Default)]
pub struct FakePolicyApi {
    policy: Option<UpdatePolicy>,
    queries: AtomicUsize,
    detail_fetches: AtomicUsize,
}

impl FakePolicyApi {
    /// No policies at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single enabled policy named `name` pinning `version`
    pub fn with_policy(name: &str, version: &str) -> Self {
        Self {
            policy: Some(UpdatePolicy {
                id: format!("{}-id", name),
                name: Some(name.to_string()),
                enabled: true,
                settings: UpdatePolicySettings {
                    sensor_version: Some(version.to_string()),
                    variants: vec![],
                },
            }),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.queries.load(Ordering::SeqCst) + self.detail_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PolicyApi for FakePolicyApi {
    async fn query_policy_ids(&self, filter: &Filter) -> falcon_image::Result<Vec<String>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let encoded = filter.encode();
        Ok(self
            .policy
            .iter()
            .filter(|p| {
                p.name
                    .as_deref()
                    .is_some_and(|name| encoded.contains(&format!("name.raw:\"{}\"", name)))
            })
            .map(|p| p.id.clone())
            .collect())
    }

    async fn policy_details(&self, ids: &[String]) -> falcon_image::Result<Vec<UpdatePolicy>> {
        self.detail_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .policy
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

/// Registry serving one fixed inventory for every repository
pub struct FakeRegistry {
    cloud: CloudRegion,
    tags: Vec<String>,
    listings: AtomicUsize,
    listed: Mutex<Vec<String>>,
}

impl FakeRegistry {
    pub fn new(tags: &[&str]) -> Self {
        Self {
            cloud: CloudRegion::Us1,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            listings: AtomicUsize::new(0),
            listed: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    /// Repository paths listed so far, in call order
    pub fn listed_paths(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }
}

#[async_trait]
impl TagRegistry for FakeRegistry {
    fn repository(&self, sensor_type: SensorType) -> RepositoryReference {
        RepositoryReference::new("registry.test", sensor_type.repository_path(self.cloud))
    }

    async fn list_tags(&self, repository: &RepositoryReference) -> falcon_image::Result<Vec<String>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        self.listed.lock().unwrap().push(repository.path.clone());
        Ok(self.tags.clone())
    }
}

/// Registry whose listing always fails
pub struct UnreachableRegistry;

#[async_trait]
impl TagRegistry for UnreachableRegistry {
    fn repository(&self, sensor_type: SensorType) -> RepositoryReference {
        RepositoryReference::new("registry.test", sensor_type.repository_path(CloudRegion::Us1))
    }

    async fn list_tags(&self, repository: &RepositoryReference) -> falcon_image::Result<Vec<String>> {
        Err(ImageError::RepositoryNotFound {
            repository: repository.to_string(),
        })
    }
}
