//! Terminal failures of a batch run.

use thiserror::Error;

use super::controller::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use crate::assemble::{AssembleError, DecodeError};
use crate::download::FetchError;
use crate::manifest::ManifestError;

/// Why a batch ended in the failed state.
///
/// No partial artifact accompanies any of these.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The manifest could not be retrieved or understood.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A page fetch failed while building a document.
    #[error("page {index} could not be fetched: {source}")]
    Fetch {
        /// 0-based manifest index.
        index: usize,
        /// The underlying fetch failure (carries the URL).
        #[source]
        source: FetchError,
    },

    /// A page image could not be decoded while building a document.
    #[error(transparent)]
    Decode(DecodeError),

    /// The artifact could not be built or serialised.
    #[error(transparent)]
    Assemble(AssembleError),

    /// Controller options are out of range.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },
}

impl BatchError {
    /// Wraps a page fetch failure.
    pub fn fetch(index: usize, source: FetchError) -> Self {
        Self::Fetch { index, source }
    }

    /// Wraps a decode failure.
    pub fn decode(source: DecodeError) -> Self {
        Self::Decode(source)
    }

    /// Wraps an assembly failure.
    pub fn assemble(source: AssembleError) -> Self {
        Self::Assemble(source)
    }
}
