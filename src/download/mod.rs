//! HTTP retrieval of manifests and page images.
//!
//! # Features
//!
//! - Streaming bodies into memory
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Structured error types carrying the failing URL
//! - The [`PageFetcher`] seam so the batch controller can be driven by any source
//!
//! # Example
//!
//! ```no_run
//! use iiif_downloader_core::download::{HttpClient, PageFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let page = client
//!     .fetch(0, "https://example.org/iiif/p1/full/full/0/default.jpg")
//!     .await?;
//! println!("page {} is {} bytes", page.index, page.bytes.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod fetcher;
pub mod filename;

pub use client::{FetchedBody, HttpClient};
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use error::FetchError;
pub use fetcher::{FetchedPage, PageFetcher};
