//! Error taxonomy for sensor image resolution
//!
//! Every variant is terminal for a single resolution attempt. Nothing here is
//! retried; the reconciling caller decides whether and when to requeue.

use thiserror::Error;

/// Result type alias using [`ImageError`]
pub type Result<T> = std::result::Result<T, ImageError>;

#[derive(Error, Debug)]
pub enum ImageError {
    /// No sensor update policy carries the requested name
    #[error("update policy '{name}' not found")]
    PolicyNotFound { name: String },

    /// The policy id returned by the query has no details
    #[error("update policy with id '{id}' not found")]
    PolicyIdNotFound { id: String },

    #[error("update policy '{id}' is disabled")]
    PolicyDisabled { id: String },

    #[error("update policy '{id}' has no sensor version for architecture '{architecture}'")]
    NoVersionForArchitecture { id: String, architecture: String },

    /// The policy's sensor version is not MAJOR.MINOR.PATCH
    #[error("update policy '{id}' has invalid sensor version '{version}'")]
    InvalidSensorVersion { id: String, version: String },

    /// No tag in the repository satisfies the sensor predicate
    #[error("no matching tag found in {repository}; available tags: {}", .tags.join(", "))]
    NoMatchingTag {
        repository: String,
        tags: Vec<String>,
    },

    /// Transport failure talking to a remote service
    #[error("{context}: {source}")]
    Http {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// Remote service answered with an unexpected status
    #[error("{context}: unexpected status {status}: {body}")]
    Status {
        context: String,
        status: u16,
        body: String,
    },

    #[error("{context}: authentication rejected")]
    Unauthorized { context: String },

    #[error("repository {repository} not found")]
    RepositoryNotFound { repository: String },

    /// Response body could not be interpreted
    #[error("{context}: {message}")]
    Decode { context: String, message: String },
}

impl ImageError {
    pub(crate) fn http(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn decode(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether the failure stems from user configuration rather than the network
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ImageError::PolicyNotFound { .. }
                | ImageError::PolicyIdNotFound { .. }
                | ImageError::PolicyDisabled { .. }
                | ImageError::NoVersionForArchitecture { .. }
                | ImageError::InvalidSensorVersion { .. }
        )
    }
}
