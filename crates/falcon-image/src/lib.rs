//! Sensor image resolution for the Falcon operator
//!
//! This crate decides which immutable image tag a sensor component runs:
//! - Resolving named sensor update policies through the management API
//! - Listing tags from the Falcon container registry
//! - Selecting the tag matching a sensor type and version prefix
//! - Guarding against needless re-resolution with a version lock
//!
//! # Example
//!
//! ```no_run
//! use falcon_core::{CloudRegion, SensorType};
//! use falcon_image::{ApiCredentials, FalconApiClient, ImageRepository, RegistryClient, RegistryCredentials};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cloud = CloudRegion::Us1;
//!     let credentials = ApiCredentials::new("client-id", "client-secret");
//!     let api = FalconApiClient::connect(cloud.api_url(), &credentials, "falcon").await?;
//!
//!     let cid = api.customer_id().await?;
//!     let token = api.registry_token().await?;
//!     let registry = RegistryClient::new(cloud, "falcon")?
//!         .with_credentials(RegistryCredentials::for_customer(&cid, token));
//!
//!     let repository = ImageRepository::new(Arc::new(api), Arc::new(registry), cloud);
//!     let image = repository
//!         .preferred_image(SensorType::Node, None, Some("prod-policy"))
//!         .await?;
//!
//!     println!("Resolved to: {}", image.image());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod arch;
pub mod error;
pub mod filter;
pub mod lock;
pub mod policy;
pub mod registry;
pub mod repository;
pub mod selector;

// Re-export main types for convenience
pub use api::{ApiCredentials, FalconApiClient};
pub use arch::{ArchitectureProbe, FixedArchitecture, HostArchitecture};
pub use error::{ImageError, Result};
pub use filter::Filter;
pub use lock::{is_locked, LockInputs};
pub use policy::{PolicyApi, UpdatePolicy, UpdatePolicyResolver};
pub use registry::{RegistryClient, RegistryCredentials, RepositoryReference, TagRegistry};
pub use repository::{ImageRepository, ResolvedImage};
pub use selector::{select_tag, TagPredicate};
