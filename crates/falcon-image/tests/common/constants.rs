//! Shared constants for falcon-image integration tests

// Management API credentials
pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
pub const API_TOKEN: &str = "api-token";

// Customer and registry login
pub const CID: &str = "1234567890ABCDEF-12";
pub const REGISTRY_PASSWORD: &str = "registry-secret";
pub const REGISTRY_TOKEN: &str = "registry-bearer";
/// `fc-1234567890abcdef:registry-secret`, base64 encoded
pub const REGISTRY_BASIC_AUTH: &str = "Basic ZmMtMTIzNDU2Nzg5MGFiY2RlZjpyZWdpc3RyeS1zZWNyZXQ=";

pub const USER_AGENT: &str = "falcon-image-tests";

// Policy fixtures
pub const POLICY_NAME: &str = "prod-policy";
pub const POLICY_ID: &str = "policy-id-1";
pub const POLICY_FILTER: &str = r#"platform_name:"Linux"+name.raw:"prod-policy""#;

// Repository paths for the us-1 cloud
pub const NODE_PATH: &str = "falcon-sensor/us-1/release/falcon-sensor";
pub const CONTAINER_PATH: &str = "falcon-container/us-1/release/falcon-sensor";
pub const KAC_PATH: &str = "falcon-kac/us-1/release/falcon-kac";
pub const IAR_PATH: &str = "falcon-imageanalyzer/us-1/release/falcon-imageanalyzer";

pub const CONTAINER_TAGS: &[&str] = &[
    "6.30.0-100.container.x86_64",
    "6.31.0-200.container.x86_64",
    "7.0.0-1.falcon-linux.x86_64",
];

pub const NODE_TAGS: &[&str] = &[
    "7.9.0-15000-1.falcon-linux.x86_64.Release.US-1",
    "7.10.0-16303-1.falcon-linux.x86_64.Release.US-1",
    "7.11.0-17000-1.falcon-linux.x86_64.Release.US-1",
];

pub fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
