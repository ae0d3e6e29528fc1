//! Falcon management API client
//!
//! Authenticates once with OAuth2 client credentials and keeps the bearer
//! token for the lifetime of the client. Every call is a plain request with
//! no retries and no caching.

use crate::error::{ImageError, Result};
use crate::filter::Filter;
use crate::policy::{PolicyApi, UpdatePolicy};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, trace};
use url::Url;

const TOKEN_PATH: &str = "/oauth2/token";
const POLICY_QUERY_PATH: &str = "/policy/queries/sensor-update/v1";
const POLICY_ENTITIES_PATH: &str = "/policy/entities/sensor-update/v2";
const CCID_PATH: &str = "/sensors/queries/installers/ccid/v1";
const REGISTRY_CREDENTIALS_PATH: &str = "/container-security/entities/image-registry-credentials/v1";

/// OAuth2 client credentials for the management API
#[derive(Clone)]
pub struct ApiCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ApiCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Authenticated client for the Falcon management API
pub struct FalconApiClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl FalconApiClient {
    /// Exchange `credentials` for an access token and return a ready client
    pub async fn connect(
        base_url: &str,
        credentials: &ApiCredentials,
        user_agent: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ImageError::http("failed to build HTTP client", e))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let context = "failed to authenticate with the Falcon API";

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &credentials.client_id)
            .append_pair("client_secret", &credentials.client_secret)
            .finish();

        debug!(base_url = %base_url, client_id = %credentials.client_id, "Requesting API token");

        let response = client
            .post(format!("{}{}", base_url, TOKEN_PATH))
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| ImageError::http(context, e))?;

        let token: TokenResponse = read_json(response, context).await?;

        Ok(Self {
            client,
            base_url,
            access_token: token.access_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_resources<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        context: &str,
    ) -> Result<Vec<T>> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ImageError::decode(context, e))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        trace!(url = %url, "Falcon API request");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| ImageError::http(context, e))?;

        let envelope: ResourceEnvelope<T> = read_json(response, context).await?;
        Ok(envelope.resources.unwrap_or_default())
    }

    /// Customer ID (with checksum suffix) of the authenticated tenant
    pub async fn customer_id(&self) -> Result<String> {
        let context = "failed to look up customer ID";
        let ids: Vec<String> = self.get_resources(CCID_PATH, &[], context).await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| ImageError::decode(context, "response carries no customer ID"))
    }

    /// Password for the customer's sensor registry login
    pub async fn registry_token(&self) -> Result<String> {
        let context = "failed to fetch registry credentials";
        let credentials: Vec<RegistryCredentialsResource> = self
            .get_resources(REGISTRY_CREDENTIALS_PATH, &[], context)
            .await?;
        credentials
            .into_iter()
            .map(|c| c.token)
            .find(|t| !t.is_empty())
            .ok_or_else(|| ImageError::decode(context, "response carries no registry token"))
    }
}

#[async_trait]
impl PolicyApi for FalconApiClient {
    async fn query_policy_ids(&self, filter: &Filter) -> Result<Vec<String>> {
        let encoded = filter.encode();
        let context = format!("failed to query sensor update policies ({})", encoded);
        self.get_resources(POLICY_QUERY_PATH, &[("filter", encoded.as_str())], &context)
            .await
    }

    async fn policy_details(&self, ids: &[String]) -> Result<Vec<UpdatePolicy>> {
        let context = format!("failed to fetch sensor update policies {}", ids.join(","));
        let query: Vec<(&str, &str)> = ids.iter().map(|id| ("ids", id.as_str())).collect();
        self.get_resources(POLICY_ENTITIES_PATH, &query, &context)
            .await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response, context: &str) -> Result<T> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ImageError::Unauthorized {
            context: context.to_string(),
        });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ImageError::Status {
            context: context.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| ImageError::decode(context, e))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ResourceEnvelope<T> {
    resources: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
struct RegistryCredentialsResource {
    #[serde(default)]
    token: String,
}
