//! The per-page retrieval seam used by the batch controller.

use async_trait::async_trait;

use super::error::FetchError;

/// Binary content of one page rendition, tagged with its manifest index.
///
/// Ownership moves from the fetcher to whichever assembler consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// 0-based manifest index of the page.
    pub index: usize,
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the image service.
    pub content_type: String,
}

impl FetchedPage {
    /// Creates a fetched page record.
    pub fn new(index: usize, bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            index,
            bytes,
            content_type: content_type.into(),
        }
    }
}

/// Retrieves the binary content of one page URL.
///
/// Implementations hold no shared mutable state and may be invoked
/// concurrently. One attempt per call; no retries.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the page at `index` from `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for transport failures and non-success responses.
    async fn fetch(&self, index: usize, url: &str) -> Result<FetchedPage, FetchError>;
}
