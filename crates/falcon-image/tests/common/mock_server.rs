//! Wiremock helpers for the registry and the management API
//!
//! Both services are served from one mock server; their paths never overlap.

use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::constants::*;

/// Tag listing endpoint path for a repository
pub fn tags_list_path(repository_path: &str) -> String {
    format!("/v2/{}/tags/list", repository_path)
}

/// Serve `tags` for `repository_path` without authentication
pub async fn mock_tags(server: &MockServer, repository_path: &str, tags: &[&str]) {
    Mock::given(method("GET"))
        .and(path(tags_list_path(repository_path)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({
                "name": repository_path,
                "tags": tags,
            })),
        )
        .mount(server)
        .await;
}

/// Serve `tags` for `repository_path` behind a bearer challenge
///
/// Anonymous requests get a `401` pointing at `/token` on the same server,
/// which hands out [`REGISTRY_TOKEN`] for the customer's basic credentials.
pub async fn mock_protected_tags(server: &MockServer, repository_path: &str, tags: &[&str]) {
    let list_path = tags_list_path(repository_path);

    // Mounted first so it wins over the challenge for authorized requests
    Mock::given(method("GET"))
        .and(path(list_path.clone()))
        .and(header("authorization", format!("Bearer {}", REGISTRY_TOKEN).as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({
                "name": repository_path,
                "tags": tags,
            })),
        )
        .expect(1)
        .mount(server)
        .await;

    let challenge = format!(
        r#"Bearer realm="{}/token",service="registry.test""#,
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path(list_path))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", challenge.as_str()))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/token"))
        .and(query_param("service", "registry.test"))
        .and(query_param("scope", format!("repository:{}:pull", repository_path).as_str()))
        .and(header("authorization", REGISTRY_BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": REGISTRY_TOKEN })))
        .expect(1)
        .mount(server)
        .await;
}

/// Answer the OAuth2 token exchange for the test client
pub async fn mock_oauth_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains(format!("client_id={}", CLIENT_ID).as_str()))
        .and(body_string_contains(format!("client_secret={}", CLIENT_SECRET).as_str()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "access_token": API_TOKEN,
            "token_type": "bearer",
            "expires_in": 1799,
        })))
        .mount(server)
        .await;
}

/// Resolve [`POLICY_NAME`] to [`POLICY_ID`] and serve `policy` as its details
pub async fn mock_policy(server: &MockServer, policy: Value) {
    Mock::given(method("GET"))
        .and(path("/policy/queries/sensor-update/v1"))
        .and(query_param("filter", POLICY_FILTER))
        .and(header("authorization", format!("Bearer {}", API_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(resources(json!([POLICY_ID]))))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/policy/entities/sensor-update/v2"))
        .and(query_param("ids", POLICY_ID))
        .and(header("authorization", format!("Bearer {}", API_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(resources(json!([policy]))))
        .mount(server)
        .await;
}

/// Enabled policy pinning `sensor_version` for every architecture
pub fn policy_json(sensor_version: &str) -> Value {
    json!({
        "id": POLICY_ID,
        "name": POLICY_NAME,
        "platform_name": "Linux",
        "enabled": true,
        "settings": {
            "build": "",
            "sensor_version": sensor_version,
            "stages": ["prod"],
        },
    })
}

/// Management API response envelope around `items`
pub fn resources(items: Value) -> Value {
    json!({
        "meta": { "query_time": 0.01, "trace_id": "trace" },
        "resources": items,
        "errors": [],
    })
}
