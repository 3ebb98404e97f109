//! Streaming archive downloads
//!
//! The response body is streamed chunk by chunk to the destination file, so
//! archive size is bounded by disk space rather than memory. Every wait for
//! the next chunk is bounded by the read timeout. A failed download leaves
//! the partial file where it is; the next fetch of the same archive
//! truncates it.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::errors::TransferFailure;

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
    read_timeout: Duration,
}

impl<'a> DownloadHandler<'a> {
    pub fn new(http_handler: &'a HttpHandler, read_timeout: Duration) -> Self {
        Self {
            http_handler,
            read_timeout,
        }
    }

    /// Stream `url` into `destination`, returning the number of bytes written
    ///
    /// An existing file at `destination` is overwritten.
    pub async fn download_file(&self, url: &Url, destination: &Path) -> Result<u64, TransferFailure> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.http_handler.get_response(url, self.read_timeout).await?;
        let mut stream = response.bytes_stream();
        let mut file = File::create(destination).await?;
        let mut written: u64 = 0;

        loop {
            let next = tokio::time::timeout(self.read_timeout, stream.next())
                .await
                .map_err(|_| TransferFailure::Timeout {
                    timeout: self.read_timeout,
                })?;

            match next {
                Some(chunk) => {
                    let chunk = chunk?;
                    file.write_all(&chunk).await?;
                    written += chunk.len() as u64;
                }
                None => break,
            }
        }

        file.flush().await?;
        tracing::debug!("Downloaded {} bytes to {}", written, destination.display());
        Ok(written)
    }
}
