//! IIIF Downloader Core Library
//!
//! This library turns an IIIF presentation manifest into a single
//! downloadable artifact: a zip of page images or a paginated PDF.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`manifest`] - Manifest retrieval and page-list extraction
//! - [`range`] - Clamping user page bounds to the manifest
//! - [`transform`] - Image API rendition URL synthesis
//! - [`download`] - HTTP retrieval and the [`PageFetcher`] seam
//! - [`assemble`] - Zip and PDF assembly
//! - [`batch`] - The controller that drives a run end to end

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assemble;
pub mod batch;
pub mod download;
pub mod manifest;
pub mod range;
pub mod transform;
mod user_agent;

// Re-export commonly used types
pub use assemble::{
    ArchiveAssembler, AssembleError, DecodeError, DocumentAssembler, OutputArtifact,
    OutputContainer,
};
pub use batch::{
    BatchController, BatchError, BatchOptions, BatchProgress, BatchReport, BatchRequest,
    BatchState,
};
pub use download::{FetchError, FetchedPage, HttpClient, PageFetcher};
pub use manifest::{Manifest, ManifestError, Page};
pub use range::{RangeRequest, ResolvedRange};
pub use transform::{TransformParameters, build_url};
