//! HTTP client for retailer pages and the ingestion endpoint
//!
//! Wraps `reqwest` with per-client request pacing and the shared retry
//! policy. Transport failures, 429 and 5xx responses are retried; other
//! client errors are returned immediately.

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::infrastructure::config::defaults;
use crate::infrastructure::request_pacer::RequestPacer;
use crate::infrastructure::retry_policy::RetryPolicy;

/// HTTP client configuration
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Minimum spacing between requests, zero disables pacing
    pub request_delay: Duration,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::HTTP_TIMEOUT_SECS,
            request_delay: Duration::ZERO,
            follow_redirects: true,
        }
    }
}

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: StatusCode },

    #[error("invalid response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl HttpError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Build(_) | Self::Decode { .. } => false,
            Self::Request { .. } => true,
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
        }
    }
}

/// Paced, retrying HTTP client
pub struct HttpClient {
    client: Client,
    pacer: RequestPacer,
    retry: RetryPolicy,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("pacer", &self.pacer)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(config: &HttpClientConfig, retry: RetryPolicy) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| HttpError::Build(format!("invalid user agent: {e}")))?,
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("he-IL,he;q=0.9,en;q=0.5"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self {
            client,
            pacer: RequestPacer::new(config.request_delay),
            retry,
        })
    }

    /// Fetch URL and return text content
    pub async fn get_text(&self, url: &str) -> Result<String, HttpError> {
        self.retry
            .execute_if(url, HttpError::is_retryable, |attempt| async move {
                self.pacer.ready().await;
                debug!("Fetching {} (attempt {})", url, attempt);

                let response = self.client.get(url).send().await.map_err(|source| {
                    HttpError::Request { url: url.to_string(), source }
                })?;
                let status = response.status();
                if !status.is_success() {
                    return Err(HttpError::Status { url: url.to_string(), status });
                }
                response
                    .text()
                    .await
                    .map_err(|source| HttpError::Decode { url: url.to_string(), source })
            })
            .await
    }

    /// POST a JSON body, optionally with a bearer token, and decode the JSON reply
    pub async fn post_json<B, R>(
        &self,
        url: &str,
        body: &B,
        bearer_token: Option<&str>,
    ) -> Result<R, HttpError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        self.retry
            .execute_if(url, HttpError::is_retryable, |attempt| async move {
                self.pacer.ready().await;
                debug!("Posting to {} (attempt {})", url, attempt);

                let mut request = self.client.post(url).json(body);
                if let Some(token) = bearer_token {
                    request = request.bearer_auth(token);
                }
                let response = request.send().await.map_err(|source| HttpError::Request {
                    url: url.to_string(),
                    source,
                })?;
                let status = response.status();
                if !status.is_success() {
                    return Err(HttpError::Status { url: url.to_string(), status });
                }
                response
                    .json::<R>()
                    .await
                    .map_err(|source| HttpError::Decode { url: url.to_string(), source })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_defaults() {
        let client = HttpClient::new(&HttpClientConfig::default(), RetryPolicy::no_retry());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_user_agent_rejected() {
        let config = HttpClientConfig {
            user_agent: "bad\nagent".to_string(),
            ..HttpClientConfig::default()
        };
        assert!(matches!(
            HttpClient::new(&config, RetryPolicy::no_retry()),
            Err(HttpError::Build(_))
        ));
    }

    #[test]
    fn test_retry_classification() {
        let url = "https://example.co.il".to_string();
        let unavailable = HttpError::Status { url: url.clone(), status: StatusCode::SERVICE_UNAVAILABLE };
        let throttled = HttpError::Status { url: url.clone(), status: StatusCode::TOO_MANY_REQUESTS };
        let missing = HttpError::Status { url, status: StatusCode::NOT_FOUND };
        assert!(unavailable.is_retryable());
        assert!(throttled.is_retryable());
        assert!(!missing.is_retryable());
    }
}
