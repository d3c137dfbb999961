//! Batch orchestration over one manifest.
//!
//! A run walks `Idle -> FetchingManifest -> RangeResolved -> FetchingPages
//! -> Assembling -> Done | Failed`. Page fetches are bounded by
//! [`BatchOptions::concurrency`]; archive runs consume results in completion
//! order while document runs restore index order through a
//! [`ReorderBuffer`] before pages reach the assembler.
//!
//! # Example
//!
//! ```no_run
//! use iiif_downloader_core::batch::{BatchController, BatchOptions, BatchRequest};
//! use iiif_downloader_core::download::HttpClient;
//! use iiif_downloader_core::assemble::OutputContainer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let controller = BatchController::new(HttpClient::new(), BatchOptions::default())?;
//! let request = BatchRequest::new("https://example.org/iiif/book1/manifest")
//!     .with_container(OutputContainer::Pdf);
//! let report = controller.run(&request).await?;
//! println!("{} ({} bytes)", report.artifact.suggested_file_name(), report.artifact.bytes().len());
//! # Ok(())
//! # }
//! ```

mod controller;
mod error;
mod reorder;
mod state;

pub use controller::{
    BatchController, BatchOptions, BatchReport, BatchRequest, DEFAULT_CONCURRENCY,
    MAX_CONCURRENCY, MIN_CONCURRENCY, PageFailure,
};
pub use error::BatchError;
pub use reorder::ReorderBuffer;
pub use state::{BatchProgress, BatchState};
