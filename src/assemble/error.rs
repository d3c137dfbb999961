//! Error types for page decoding and artifact assembly.

use thiserror::Error;

/// A fetched page could not be turned into a document page.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not an image format we can read.
    #[error("page {index}: cannot decode image ({content_type}): {source}")]
    Image {
        /// 0-based manifest index.
        index: usize,
        /// Content type reported by the server.
        content_type: String,
        /// The underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// Compressing converted samples failed.
    #[error("page {index}: failed to compress image samples: {source}")]
    Compress {
        /// 0-based manifest index.
        index: usize,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The blocking decode task panicked or was cancelled.
    #[error("page {index}: decode task failed: {source}")]
    Task {
        /// 0-based manifest index.
        index: usize,
        /// The join failure.
        #[source]
        source: tokio::task::JoinError,
    },
}

impl DecodeError {
    /// Creates an image decode error.
    pub fn image(index: usize, content_type: impl Into<String>, source: image::ImageError) -> Self {
        Self::Image {
            index,
            content_type: content_type.into(),
            source,
        }
    }

    /// Returns the page index the failure belongs to.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Image { index, .. } | Self::Compress { index, .. } | Self::Task { index, .. } => {
                *index
            }
        }
    }
}

/// Failures while building or finalizing an artifact.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// Writing the zip container failed.
    #[error("failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Building or serialising the PDF failed.
    #[error("failed to write document: {0}")]
    Document(#[from] lopdf::Error),

    /// A page was added out of ascending index order.
    #[error("page {actual} added out of order (expected page {expected})")]
    OutOfOrder {
        /// The next index the document needs.
        expected: usize,
        /// The index that was supplied.
        actual: usize,
    },

    /// Finalize was requested before the last expected page was added.
    #[error("document incomplete: {added} of {expected} pages added")]
    Incomplete {
        /// Pages the range requires.
        expected: usize,
        /// Pages actually added.
        added: usize,
    },

    /// The blocking serialisation task panicked or was cancelled.
    #[error("assembly task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
