//! # falcon-core
//!
//! Core library for the Falcon sensor operator providing:
//! - Sensor, cloud region and architecture identifiers
//! - Runtime configuration types and the hierarchical loader
//! - Shared error types

pub mod config;
pub mod error;
pub mod types;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use types::{Architecture, CloudRegion, RuntimeConfig, SensorType};
