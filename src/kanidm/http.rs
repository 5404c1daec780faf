//! HTTP utilities for Kanidm REST API calls

use crate::error::{Error, ErrorKind, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const JSON: &str = "application/json";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let char_count = body.chars().count();
    let truncated = if char_count > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Map a response status to success or a typed error.
///
/// 2xx passes; 401, 403 and 404 get their own variants; anything else
/// carries the status and the body text.
pub fn check_status(status: StatusCode, body: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }

    match status {
        StatusCode::NOT_FOUND => Err(Error::NotFound),
        StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
        StatusCode::FORBIDDEN => Err(Error::Forbidden),
        _ => Err(Error::Api {
            status: status.as_u16(),
            body: body.to_string(),
        }),
    }
}

/// A successful response whose body has already been read in full
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Decode the JSON body into `T`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(Error::Decode)
    }
}

/// HTTP client wrapper for Kanidm API calls
#[derive(Clone)]
pub struct KanidmHttpClient {
    client: Client,
}

impl KanidmHttpClient {
    /// Create a new HTTP client with an overall per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("kanidm-tf/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|source| Error::Transport {
                context: "create HTTP client",
                source,
            })?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client; its own timeout settings apply
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Send one request and classify the response.
    ///
    /// The body is serialized when present, otherwise an empty body is sent.
    /// The response body is always read to completion, success or failure.
    pub async fn execute<B>(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        tracing::debug!("{} {}", method, url);

        let payload = match body {
            Some(body) => serde_json::to_vec(body).map_err(Error::Encode)?,
            None => Vec::new(),
        };

        let response = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .body(payload)
            .send()
            .await
            .map_err(|source| Error::Transport {
                context: "execute request",
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| Error::Transport {
            context: "read response body",
            source,
        })?;

        if let Err(err) = check_status(status, &body) {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(err);
        }

        Ok(ApiResponse { status, body })
    }
}

/// Format a client error for display to an operator
pub fn format_error(error: &Error) -> String {
    match error.kind() {
        ErrorKind::Unauthorized => {
            "Authentication failed. Check the API token (KANIDM_TOKEN).".to_string()
        }
        ErrorKind::Forbidden => {
            "Permission denied. The token's account lacks access to this resource.".to_string()
        }
        ErrorKind::NotFound => "Resource not found.".to_string(),
        ErrorKind::Transport => {
            "Request failed. Check the server URL and your network connection.".to_string()
        }
        _ => {
            let message = error.to_string();
            let sanitized: String = message
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(160)
                .collect();
            if sanitized.len() < message.len() {
                format!("{}...", sanitized)
            } else {
                sanitized
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status_classification() {
        assert!(check_status(StatusCode::OK, "").is_ok());
        assert!(check_status(StatusCode::NO_CONTENT, "").is_ok());
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND, "gone"),
            Err(Error::NotFound)
        ));
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, ""),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN, ""),
            Err(Error::Forbidden)
        ));

        match check_status(StatusCode::CONFLICT, "already exists") {
            Err(Error::Api { status, body }) => {
                assert_eq!(status, 409);
                assert_eq!(body, "already exists");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        let out = sanitize_for_log(&long);
        assert!(out.contains("[truncated, 600 bytes total]"));

        assert_eq!(sanitize_for_log("line\nbreak"), "linebreak");
    }

    #[test]
    fn test_format_error_hides_details_for_auth() {
        let err = Error::Unauthorized.context("get person");
        assert!(format_error(&err).starts_with("Authentication failed"));

        let err = Error::Api {
            status: 500,
            body: "internal".to_string(),
        };
        assert_eq!(format_error(&err), "API error (HTTP 500): internal");
    }
}
