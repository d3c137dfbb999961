//! Error types for manifest retrieval and page-list extraction.

use thiserror::Error;

use crate::download::FetchError;

/// Errors that abort a run before any page is fetched.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest could not be retrieved.
    #[error("failed to fetch manifest")]
    Fetch {
        /// The underlying fetch failure (carries the URL).
        #[source]
        source: FetchError,
    },

    /// The body is not valid JSON of the expected shape.
    #[error("failed to parse manifest {url}: {source}")]
    Parse {
        /// The manifest URL.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// No page list at `sequences[0].canvases`.
    #[error("manifest {url} has no page list (sequences[0].canvases)")]
    MissingPages {
        /// The manifest URL.
        url: String,
    },
}

impl ManifestError {
    /// Wraps a transport failure.
    pub fn fetch(source: FetchError) -> Self {
        Self::Fetch { source }
    }

    /// Creates a parse error.
    pub fn parse(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            url: url.into(),
            source,
        }
    }

    /// Creates a missing page list error.
    pub fn missing_pages(url: impl Into<String>) -> Self {
        Self::MissingPages { url: url.into() }
    }
}
