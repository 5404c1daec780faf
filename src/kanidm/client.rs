//! Kanidm Client
//!
//! Main client for the Kanidm REST API, combining the bearer token, the
//! server base URL and the HTTP transport.

use super::http::{ApiResponse, KanidmHttpClient};
use crate::error::{Error, Result};
use reqwest::Method;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default overall timeout for a single request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`KanidmClient`]
#[derive(Clone)]
pub struct ClientConfig {
    /// Server base URL, e.g. `https://idm.example.com`
    pub base_url: String,
    /// API token sent as `Authorization: Bearer <token>`
    pub token: String,
    /// Overall timeout per request. Ignored when `http_client` is set.
    pub timeout: Duration,
    /// Pre-built reqwest client to use instead of building one
    pub http_client: Option<reqwest::Client>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
            http_client: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

// Keeps the token out of debug output
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("http_client", &self.http_client.is_some())
            .finish()
    }
}

/// Main Kanidm client
#[derive(Clone)]
pub struct KanidmClient {
    pub http: KanidmHttpClient,
    base_url: String,
    token: String,
}

impl KanidmClient {
    /// Create a new Kanidm client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("missing Kanidm server URL".to_string()));
        }
        Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("invalid Kanidm server URL '{}': {}", base_url, e)))?;

        if config.token.is_empty() {
            return Err(Error::Config("missing Kanidm API token".to_string()));
        }

        let http = match config.http_client {
            Some(client) => KanidmHttpClient::from_client(client),
            None => KanidmHttpClient::new(config.timeout)?,
        };

        Ok(Self {
            http,
            base_url,
            token: config.token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request with a JSON body
    pub async fn send<B>(&self, method: Method, path: &str, body: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.http
            .execute(method, &self.url(path), &self.token, Some(body))
            .await
    }

    /// Send a request with an empty body
    pub async fn send_empty(&self, method: Method, path: &str) -> Result<ApiResponse> {
        self.http
            .execute::<()>(method, &self.url(path), &self.token, None)
            .await
    }

    /// Make a GET request to a Kanidm API path
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send_empty(Method::GET, path).await
    }

    /// Make a POST request to a Kanidm API path
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        self.send(Method::POST, path, body).await
    }

    /// Make a PATCH request to a Kanidm API path
    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        self.send(Method::PATCH, path, body).await
    }

    /// Make a DELETE request to a Kanidm API path
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send_empty(Method::DELETE, path).await
    }
}

// =========================================================================
// API path helpers
// =========================================================================

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// `/v1/person[/{id}]`
pub fn person_path(id: Option<&str>) -> String {
    resource_path("person", id)
}

/// `/v1/service_account[/{id}]`
pub fn service_account_path(id: Option<&str>) -> String {
    resource_path("service_account", id)
}

/// `/v1/group[/{id}]`
pub fn group_path(id: Option<&str>) -> String {
    resource_path("group", id)
}

/// `/v1/oauth2[/{name}]`
pub fn oauth2_path(name: Option<&str>) -> String {
    resource_path("oauth2", name)
}

fn resource_path(kind: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("/v1/{}/{}", kind, segment(id)),
        None => format!("/v1/{}", kind),
    }
}

/// Append fixed endpoint parts such as `_scopemap` verbatim
pub fn sub_path(base: &str, fixed: &[&'static str]) -> String {
    let mut path = base.to_string();
    for part in fixed {
        path.push('/');
        path.push_str(part);
    }
    path
}

/// Append one caller-supplied value, always percent-encoded
pub fn with_segment(base: &str, value: &str) -> String {
    format!("{}/{}", base, segment(value))
}
