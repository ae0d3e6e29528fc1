//! Type definitions shared across the Falcon crates

pub mod runtime_config;
pub mod sensor_types;

pub use runtime_config::{FalconConfig, NetworkConfig, ReconcileConfig, RuntimeConfig};
pub use sensor_types::{Architecture, CloudRegion, SensorType};
