pub mod friends;
pub mod types;

use chrono::{DateTime, Utc};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::auth::credentials::Credentials;
use crate::auth::oauth1;
use types::ApiErrorBody;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Recoverable: the caller should back off and retry the same request.
    #[error("{message}")]
    RateLimited {
        message: String,
        reset_at: Option<DateTime<Utc>>,
    },
    /// Any other API failure; surfaced to the user, never auto-retried.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("deserialization error: {0}")]
    Deserialize(String),
}

// ---------------------------------------------------------------------------
// API client
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://api.twitter.com/1.1";

/// Authenticated session with the Twitter v1.1 REST API.
///
/// All methods take `&self`; the session carries no mutable state, so a
/// single client can be shared between the fetch loop and the controller
/// behind an `Arc`.
pub struct TwitterApiClient {
    http_client: reqwest::Client,
    credentials: Credentials,
}

impl TwitterApiClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            credentials,
        }
    }

    /// The screen name whose friends list this session queries.
    pub fn user_name(&self) -> &str {
        &self.credentials.user_name
    }

    /// Issue a signed request. Parameters must already be encoded into the
    /// URL's query string so the OAuth signature covers them.
    pub(crate) async fn signed_request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
    ) -> Result<T, ApiClientError> {
        let auth_header = oauth1::authorization_header(method.as_str(), url, &self.credentials);

        let resp = self
            .http_client
            .request(method, url)
            .header("Authorization", &auth_header)
            .send()
            .await?;

        self.handle_response(resp).await
    }

    /// Parse rate-limit headers, check status, and deserialize the body.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: Response,
    ) -> Result<T, ApiClientError> {
        let reset_at = resp
            .headers()
            .get("x-rate-limit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|ts| DateTime::from_timestamp(ts, 0));

        let status = resp.status();

        if status.as_u16() == 429 || status.as_u16() == 420 {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.first_message().map(str::to_owned))
                .unwrap_or_else(|| "Rate limit exceeded".to_owned());
            return Err(ApiClientError::RateLimited { message, reset_at });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            // Prefer the API's own message over the raw body.
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.first_message().map(str::to_owned))
                .unwrap_or(body);
            return Err(ApiClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        serde_json::from_str::<T>(&body)
            .map_err(|e| ApiClientError::Deserialize(format!("{e}: {body}")))
    }

    /// Build a full API URL from a path (e.g. "/users/show.json?user_id=1").
    pub(crate) fn url(path: &str) -> String {
        format!("{BASE_URL}{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_error_displays_api_message() {
        let err = ApiClientError::RateLimited {
            message: "Rate limit exceeded".into(),
            reset_at: None,
        };
        assert_eq!(err.to_string(), "Rate limit exceeded");
    }

    #[test]
    fn api_error_displays_api_message() {
        let err = ApiClientError::Api {
            status: 404,
            message: "not found".into(),
        };
        assert_eq!(err.to_string(), "not found");
    }
}
