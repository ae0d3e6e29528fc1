//! Error types for falcon-core

use thiserror::Error;

/// Result type alias using falcon-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the Falcon operator
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown sensor type
    #[error(
        "Unknown sensor type: {name}. Valid types: node, sidecar, regioned-sidecar, admission, image-analyzer"
    )]
    UnknownSensorType { name: String },

    /// Unknown cloud region
    #[error("Unknown cloud region: {name}. Valid regions: us-1, us-2, eu-1, us-gov-1, us-gov-2")]
    UnknownCloudRegion { name: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an unknown sensor type error
    pub fn unknown_sensor_type(name: impl Into<String>) -> Self {
        Self::UnknownSensorType { name: name.into() }
    }

    /// Create an unknown cloud region error
    pub fn unknown_cloud_region(name: impl Into<String>) -> Self {
        Self::UnknownCloudRegion { name: name.into() }
    }
}
