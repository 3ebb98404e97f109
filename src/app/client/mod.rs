//! HTTP client for fetching remote archives
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: Request pacing and response status handling
//! - `download`: Streaming of response bodies to disk

use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::errors::{ConfigResult, TransferFailure};

pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;

use download::DownloadHandler;
use http::HttpHandler;

/// HTTP client shared by every archive job of a run
///
/// Wrap in an `Arc` to share between concurrent jobs; the rate limiter is
/// global to the client.
#[derive(Debug)]
pub struct ArchiveClient {
    http_handler: HttpHandler,
    read_timeout: Duration,
}

impl ArchiveClient {
    /// Creates a client with default settings
    pub fn new() -> ConfigResult<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Creates a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid or the
    /// underlying HTTP client cannot be built
    pub fn with_config(config: &ClientConfig) -> ConfigResult<Self> {
        config.validate()?;
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.rate_limit_rps)?;

        tracing::debug!(
            "Created archive client ({} req/s, read timeout {:?})",
            config.rate_limit_rps,
            config.read_timeout
        );

        Ok(Self {
            http_handler,
            read_timeout: config.read_timeout,
        })
    }

    /// Download `url` to `destination`, returning the number of bytes written
    pub async fn download_file(&self, url: &Url, destination: &Path) -> Result<u64, TransferFailure> {
        DownloadHandler::new(&self.http_handler, self.read_timeout)
            .download_file(url, destination)
            .await
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;

    #[test]
    fn test_client_creation() {
        let client = ArchiveClient::new().unwrap();
        assert_eq!(client.read_timeout(), crate::constants::DEFAULT_READ_TIMEOUT);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ClientConfig {
            rate_limit_rps: 0,
            ..Default::default()
        };
        let result = ArchiveClient::with_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }
}
