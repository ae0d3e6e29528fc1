//! Falcon container registry access
//!
//! Tags are listed over the registry v2 wire protocol. A `401` answer carrying
//! a bearer challenge is exchanged for a token at the advertised realm using
//! the customer's registry credentials. Nothing is cached between calls: every
//! listing is a fresh round trip.

use crate::error::{ImageError, Result};
use async_trait::async_trait;
use falcon_core::{CloudRegion, SensorType};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, LINK, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, trace};
use url::Url;

/// Tags requested per page
const PAGE_SIZE: usize = 1000;

/// Fully-qualified repository inside a registry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryReference {
    /// Registry host, with port when not the scheme default
    pub registry: String,
    /// Repository path (e.g. "falcon-sensor/us-1/release/falcon-sensor")
    pub path: String,
}

impl RepositoryReference {
    pub fn new(registry: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            path: path.into(),
        }
    }

    /// Full image reference for `tag` in this repository
    pub fn image(&self, tag: &str) -> String {
        format!("{}:{}", self, tag)
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.path)
    }
}

/// Read-only capability over a sensor image registry
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagRegistry: Send + Sync {
    /// Repository holding images for `sensor_type`
    fn repository(&self, sensor_type: SensorType) -> RepositoryReference;

    /// All tags currently published in `repository`, in registry order
    async fn list_tags(&self, repository: &RepositoryReference) -> Result<Vec<String>>;
}

/// Basic credentials presented to the registry's token realm
#[derive(Clone)]
pub struct RegistryCredentials {
    username: String,
    password: String,
}

impl RegistryCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Credentials for a customer: the username is derived from the CID,
    /// the password is the registry token issued by the management API.
    pub fn for_customer(cid: &str, registry_token: impl Into<String>) -> Self {
        Self::new(registry_username(cid), registry_token)
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registry login for a CID: `fc-` plus the lower-cased id without its checksum
pub fn registry_username(cid: &str) -> String {
    let id = cid.split('-').next().unwrap_or(cid);
    format!("fc-{}", id.to_lowercase())
}

/// Client for the Falcon sensor registry
pub struct RegistryClient {
    client: reqwest::Client,
    /// Base URL including scheme (e.g. "https://registry.crowdstrike.com")
    base_url: String,
    /// Host (and port) as it appears in image references
    registry_host: String,
    cloud: CloudRegion,
    credentials: Option<RegistryCredentials>,
}

impl RegistryClient {
    /// Create a client for the registry serving `cloud`
    pub fn new(cloud: CloudRegion, user_agent: &str) -> Result<Self> {
        Self::with_base_url(cloud, &format!("https://{}", cloud.registry_host()), user_agent)
    }

    /// Create a client against an explicit registry base URL
    pub fn with_base_url(cloud: CloudRegion, base_url: &str, user_agent: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ImageError::decode(format!("invalid registry URL {}", base_url), e))?;
        let host = parsed.host_str().ok_or_else(|| {
            ImageError::decode(format!("invalid registry URL {}", base_url), "missing host")
        })?;
        let registry_host = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ImageError::http("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            registry_host,
            cloud,
            credentials: None,
        })
    }

    /// Set the credentials presented when the registry challenges
    pub fn with_credentials(mut self, credentials: RegistryCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn cloud(&self) -> CloudRegion {
        self.cloud
    }

    async fn get(&self, url: &str, bearer: Option<&str>, context: &str) -> Result<reqwest::Response> {
        let mut headers = HeaderMap::new();
        if let Some(token) = bearer {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ImageError::decode(context, e))?;
            headers.insert(AUTHORIZATION, value);
        }

        self.client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| ImageError::http(context, e))
    }

    /// Exchange the registry credentials for a bearer token at the challenge realm
    async fn fetch_token(&self, challenge: &BearerChallenge, repository: &RepositoryReference) -> Result<String> {
        let context = format!("failed to obtain registry token for {}", repository);

        let mut url = Url::parse(&challenge.realm).map_err(|e| ImageError::decode(&context, e))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(service) = &challenge.service {
                query.append_pair("service", service);
            }
            let scope = challenge
                .scope
                .clone()
                .unwrap_or_else(|| format!("repository:{}:pull", repository.path));
            query.append_pair("scope", &scope);
        }

        debug!(realm = %challenge.realm, repository = %repository, "Requesting registry token");

        let mut request = self.client.get(url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        let response = request
            .send()
            .await
            .map_err(|e| ImageError::http(&context, e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ImageError::Unauthorized { context });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::Status {
                context,
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ImageError::decode(&context, e))?;

        token
            .token
            .or(token.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ImageError::decode(context, "token response carries no token"))
    }
}

#[async_trait]
impl TagRegistry for RegistryClient {
    fn repository(&self, sensor_type: SensorType) -> RepositoryReference {
        RepositoryReference::new(
            self.registry_host.clone(),
            sensor_type.repository_path(self.cloud),
        )
    }

    async fn list_tags(&self, repository: &RepositoryReference) -> Result<Vec<String>> {
        let context = format!("failed to list tags for {}", repository);
        let mut all_tags = Vec::new();
        let mut bearer: Option<String> = None;
        let mut visited = HashSet::new();
        let mut url = format!(
            "{}/v2/{}/tags/list?n={}",
            self.base_url, repository.path, PAGE_SIZE
        );

        loop {
            debug!(url = %url, "Listing tags");
            visited.insert(url.clone());

            let mut response = self.get(&url, bearer.as_deref(), &context).await?;

            if response.status() == StatusCode::UNAUTHORIZED && bearer.is_none() {
                let challenge = response
                    .headers()
                    .get(WWW_AUTHENTICATE)
                    .and_then(|h| h.to_str().ok())
                    .and_then(BearerChallenge::parse)
                    .ok_or_else(|| ImageError::Unauthorized {
                        context: context.clone(),
                    })?;
                let token = self.fetch_token(&challenge, repository).await?;
                response = self.get(&url, Some(&token), &context).await?;
                bearer = Some(token);
            }

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(ImageError::Unauthorized { context });
            }
            if status == StatusCode::NOT_FOUND {
                return Err(ImageError::RepositoryNotFound {
                    repository: repository.to_string(),
                });
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ImageError::Status {
                    context,
                    status: status.as_u16(),
                    body: if body.is_empty() {
                        "(no response body)".to_string()
                    } else {
                        body
                    },
                });
            }

            let next_url = response
                .headers()
                .get(LINK)
                .and_then(|h| h.to_str().ok())
                .and_then(|link| parse_link_header(link, &self.base_url));

            let page: TagsResponse = response
                .json()
                .await
                .map_err(|e| ImageError::decode(&context, e))?;

            all_tags.extend(page.tags.unwrap_or_default());

            match next_url {
                Some(next) if visited.contains(&next) => {
                    debug!(url = %next, "Pagination revisits a page, stopping");
                    break;
                }
                Some(next) => url = next,
                None => break,
            }
        }

        trace!(repository = %repository, count = all_tags.len(), "Found tags");
        Ok(all_tags)
    }
}

/// Parameters of a `WWW-Authenticate: Bearer ...` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
struct BearerChallenge {
    realm: String,
    service: Option<String>,
    scope: Option<String>,
}

static CHALLENGE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z_]+)="([^"]*)""#).expect("valid challenge regex"));

impl BearerChallenge {
    fn parse(header: &str) -> Option<Self> {
        let (scheme, params) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        let mut realm = None;
        let mut service = None;
        let mut scope = None;
        for caps in CHALLENGE_PARAM.captures_iter(params) {
            let value = caps[2].to_string();
            match caps[1].to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "service" => service = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        Some(Self {
            realm: realm?,
            service,
            scope,
        })
    }
}

/// Parse Link header for pagination
/// Format: </v2/repo/tags/list?n=1000&last=tag>; rel="next"
fn parse_link_header(link: &str, base_url: &str) -> Option<String> {
    for part in link.split(',') {
        let part = part.trim();
        if part.contains("rel=\"next\"") {
            let start = part.find('<')?;
            // '>' is only searched after '<' so a malformed part cannot invert the slice
            let end = start + 1 + part[start + 1..].find('>')?;
            let url = &part[start + 1..end];
            if url.starts_with('/') {
                return Some(format!("{}{}", base_url, url));
            }
            return Some(url.to_string());
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}
