//! HTTP client wrapper for fetching manifests and page images.
//!
//! This module provides the `HttpClient` struct which streams response
//! bodies into memory with proper timeout configuration and error handling.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, FALLBACK_CONTENT_TYPE, READ_TIMEOUT_SECS};
use super::error::FetchError;
use super::fetcher::{FetchedPage, PageFetcher};
use crate::user_agent;

/// Response body plus the content type the server reported.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// `Content-Type` header value, or `application/octet-stream`.
    pub content_type: String,
}

/// HTTP client for manifest and image retrieval.
///
/// This client is designed to be created once and reused for every request
/// of a batch, taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use iiif_downloader_core::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let body = client.get_bytes("https://example.org/iiif/book1/manifest").await?;
/// println!("{} bytes ({})", body.bytes.len(), body.content_type);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = build_client(connect_timeout_secs, read_timeout_secs)
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Issues one GET request and collects the whole body.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - The body stream breaks off mid-transfer
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_bytes(&self, url: &str) -> Result<FetchedBody, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| FALLBACK_CONTENT_TYPE.to_string(), str::to_string);

        let bytes = collect_body(response, url).await?;
        debug!(bytes = bytes.len(), content_type = %content_type, "fetch complete");

        Ok(FetchedBody {
            bytes,
            content_type,
        })
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, index: usize, url: &str) -> Result<FetchedPage, FetchError> {
        let body = self.get_bytes(url).await?;
        Ok(FetchedPage::new(index, body.bytes, body.content_type))
    }
}

/// Streams the response body into memory.
async fn collect_body(response: reqwest::Response, url: &str) -> Result<Vec<u8>, FetchError> {
    let mut buffer = Vec::with_capacity(
        response
            .content_length()
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or(0),
    );
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer)
}

fn build_client(connect_timeout_secs: u64, read_timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .read_timeout(Duration::from_secs(read_timeout_secs))
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
        .build()
}
