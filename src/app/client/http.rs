//! Core HTTP operations with rate limiting
//!
//! Requests are paced by a `governor` limiter shared by every job using the
//! client. Failed requests are not retried: a failure is reported to the
//! orchestrator and the next run's reconciliation picks the archive up again.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::Client;
use url::Url;

use crate::errors::{ConfigError, ConfigResult, TransferFailure};

/// HTTP operations handler with request pacing
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and rate limiting
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `rate_limit_rps` is zero
    pub fn new(client: Client, rate_limit_rps: u32) -> ConfigResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> ConfigResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| ConfigError::InvalidValue {
            field: "client.rate_limit_rps".to_string(),
            value: rate_limit_rps.to_string(),
            reason: "Rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// Send a GET request and wait for a successful response
    ///
    /// The wait for response headers is bounded by `read_timeout`; the body
    /// is left unread for the caller to stream.
    ///
    /// # Errors
    ///
    /// `TransferFailure::Timeout` if no response arrives in time,
    /// `TransferFailure::Status` for a non-success status and
    /// `TransferFailure::Http` for connection-level failures.
    pub async fn get_response(
        &self,
        url: &Url,
        read_timeout: Duration,
    ) -> Result<reqwest::Response, TransferFailure> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let response = tokio::time::timeout(read_timeout, self.client.get(url.as_str()).send())
            .await
            .map_err(|_| TransferFailure::Timeout {
                timeout: read_timeout,
            })??;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("{} responded with HTTP {}", url, status.as_u16());
            return Err(TransferFailure::Status {
                status: status.as_u16(),
            });
        }

        tracing::debug!("Response headers received: {}", url);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::config::ClientConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handler() -> HttpHandler {
        let client = ClientConfig::default().build_http_client().unwrap();
        HttpHandler::new(client, 50).unwrap()
    }

    #[tokio::test]
    async fn test_rate_limiter_creation() {
        let rate_limiter = HttpHandler::build_rate_limiter(5).unwrap();
        rate_limiter.until_ready().await;
    }

    #[test]
    fn test_rate_limiter_zero_fails() {
        let result = HttpHandler::build_rate_limiter(0);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[tokio::test]
    async fn test_success_response_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/A.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK".to_vec()))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/A.zip", server.uri())).unwrap();
        let response = handler()
            .get_response(&url, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_error_status_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.zip"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/gone.zip", server.uri())).unwrap();
        let result = handler().get_response(&url, Duration::from_secs(5)).await;

        assert!(matches!(result, Err(TransferFailure::Status { status: 404 })));
    }

    #[tokio::test]
    async fn test_slow_headers_time_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/slow.zip", server.uri())).unwrap();
        let result = handler()
            .get_response(&url, Duration::from_millis(200))
            .await;

        assert!(matches!(result, Err(TransferFailure::Timeout { .. })));
    }
}
