//! Streaming image downloader
//!
//! Each image is written straight to its final path as the body arrives. A
//! failed or cancelled download removes whatever it had written, so a file on
//! disk is always a complete response body.

use futures_util::StreamExt;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Size of each write to the destination file
pub const WRITE_CHUNK_SIZE: usize = 1024;

/// Errors that can occur while downloading one image
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Connection, TLS, redirect or body-read failure
    #[error("network error downloading {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// No response headers, or no body data, within the read timeout
    #[error("timeout downloading {url}")]
    Timeout { url: String },

    #[error("HTTP {status} downloading {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("IO error writing to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download cancelled: {url}")]
    Cancelled { url: String },
}

impl DownloadError {
    fn network(url: &Url, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::Network {
                url: url.to_string(),
                source,
            }
        }
    }

    fn timeout(url: &Url) -> Self {
        Self::Timeout {
            url: url.to_string(),
        }
    }

    fn cancelled(url: &Url) -> Self {
        Self::Cancelled {
            url: url.to_string(),
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Downloads one image to a fully resolved destination path
///
/// # Behaviour
///
/// - Sends a GET through `client` (same headers as page fetches)
/// - `read_timeout` bounds the wait for the response headers and for each
///   body chunk; a slow but steady transfer never times out
/// - Non-2xx responses are errors and leave no file behind
/// - The destination is created or truncated, then filled in
///   [`WRITE_CHUNK_SIZE`] pieces
/// - `cancel` is checked before the request and raced against every await
///
/// # Returns
///
/// * `Ok(u64)` - Number of bytes written
/// * `Err(DownloadError)` - The image was not saved; any partial file is removed
pub async fn download_one(
    client: &Client,
    url: &Url,
    destination: &Path,
    read_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<u64, DownloadError> {
    if cancel.is_cancelled() {
        return Err(DownloadError::cancelled(url));
    }

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
        sent = tokio::time::timeout(read_timeout, client.get(url.clone()).send()) => match sent {
            Err(_) => return Err(DownloadError::timeout(url)),
            Ok(result) => result.map_err(|e| DownloadError::network(url, e))?,
        },
    };

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut file = File::create(destination)
        .await
        .map_err(|e| DownloadError::io(destination, e))?;

    let result = stream_to_file(&mut file, response, url, destination, read_timeout, cancel).await;

    if let Err(e) = &result {
        drop(file);
        tracing::debug!(
            "Removing partial file {} after error: {}",
            destination.display(),
            e
        );
        if let Err(remove_err) = tokio::fs::remove_file(destination).await {
            tracing::warn!(
                "Failed to remove partial file {}: {}",
                destination.display(),
                remove_err
            );
        }
    }

    result
}

/// Streams the response body into `file`, returning bytes written
async fn stream_to_file(
    file: &mut File,
    response: Response,
    url: &Url,
    path: &Path,
    read_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<u64, DownloadError> {
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            next = tokio::time::timeout(read_timeout, stream.next()) => {
                next.map_err(|_| DownloadError::timeout(url))?
            }
        };

        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(|e| DownloadError::network(url, e))?;

        for piece in chunk.chunks(WRITE_CHUNK_SIZE) {
            file.write_all(piece)
                .await
                .map_err(|e| DownloadError::io(path, e))?;
        }

        bytes_written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| DownloadError::io(path, e))?;

    Ok(bytes_written)
}
