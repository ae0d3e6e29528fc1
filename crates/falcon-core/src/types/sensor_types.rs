//! Sensor, cloud and architecture identifiers
//!
//! These types decide where a sensor image lives (registry host and
//! repository path) and which platform variant of an update policy applies.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deployable Falcon sensor component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorType {
    /// Node daemon (DaemonSet)
    Node,
    /// Container sidecar injector
    Sidecar,
    /// Admission controller (KAC)
    Admission,
    /// Image assessment controller (IAR)
    ImageAnalyzer,
    /// Sidecar injector whose tags carry a cloud region suffix
    RegionedSidecar,
}

impl SensorType {
    /// All sensor types, in declaration order
    pub const ALL: [SensorType; 5] = [
        SensorType::Node,
        SensorType::Sidecar,
        SensorType::Admission,
        SensorType::ImageAnalyzer,
        SensorType::RegionedSidecar,
    ];

    /// Kebab-case name used on the command line and in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Node => "node",
            SensorType::Sidecar => "sidecar",
            SensorType::Admission => "admission",
            SensorType::ImageAnalyzer => "image-analyzer",
            SensorType::RegionedSidecar => "regioned-sidecar",
        }
    }

    /// Repository path inside the Falcon registry for this sensor in `cloud`
    pub fn repository_path(&self, cloud: CloudRegion) -> String {
        let segment = cloud.registry_segment();
        match self {
            SensorType::Node => format!("falcon-sensor/{}/release/falcon-sensor", segment),
            SensorType::Sidecar | SensorType::RegionedSidecar => {
                format!("falcon-container/{}/release/falcon-sensor", segment)
            }
            SensorType::Admission => format!("falcon-kac/{}/release/falcon-kac", segment),
            SensorType::ImageAnalyzer => {
                format!("falcon-imageanalyzer/{}/release/falcon-imageanalyzer", segment)
            }
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::unknown_sensor_type(s))
    }
}

/// Falcon cloud region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CloudRegion {
    #[default]
    #[serde(rename = "us-1")]
    Us1,
    #[serde(rename = "us-2")]
    Us2,
    #[serde(rename = "eu-1")]
    Eu1,
    #[serde(rename = "us-gov-1")]
    UsGov1,
    #[serde(rename = "us-gov-2")]
    UsGov2,
}

impl CloudRegion {
    pub const ALL: [CloudRegion; 5] = [
        CloudRegion::Us1,
        CloudRegion::Us2,
        CloudRegion::Eu1,
        CloudRegion::UsGov1,
        CloudRegion::UsGov2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CloudRegion::Us1 => "us-1",
            CloudRegion::Us2 => "us-2",
            CloudRegion::Eu1 => "eu-1",
            CloudRegion::UsGov1 => "us-gov-1",
            CloudRegion::UsGov2 => "us-gov-2",
        }
    }

    /// Base URL of the management API for this cloud
    pub fn api_url(&self) -> &'static str {
        match self {
            CloudRegion::Us1 => "https://api.crowdstrike.com",
            CloudRegion::Us2 => "https://api.us-2.crowdstrike.com",
            CloudRegion::Eu1 => "https://api.eu-1.crowdstrike.com",
            CloudRegion::UsGov1 => "https://api.laggar.gcw.crowdstrike.com",
            CloudRegion::UsGov2 => "https://api.us-gov-2.crowdstrike.mil",
        }
    }

    /// Hostname of the sensor image registry for this cloud
    pub fn registry_host(&self) -> &'static str {
        match self {
            CloudRegion::UsGov1 => "registry.laggar.gcw.crowdstrike.com",
            CloudRegion::UsGov2 => "registry.us-gov-2.crowdstrike.mil",
            _ => "registry.crowdstrike.com",
        }
    }

    /// Path segment used inside registry repository paths
    pub fn registry_segment(&self) -> &'static str {
        match self {
            CloudRegion::Us1 => "us-1",
            CloudRegion::Us2 => "us-2",
            CloudRegion::Eu1 => "eu-1",
            CloudRegion::UsGov1 => "gov1",
            CloudRegion::UsGov2 => "gov2",
        }
    }
}

impl fmt::Display for CloudRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudRegion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CloudRegion::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::unknown_cloud_region(s))
    }
}

/// CPU architecture of the node an image will run on (e.g. "amd64", "arm64")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Architecture(String);

impl Architecture {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Architecture {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
