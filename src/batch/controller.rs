//! The batch controller: one manifest in, one artifact out.

use std::fmt;
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, error, info, instrument, warn};

use super::error::BatchError;
use super::reorder::ReorderBuffer;
use super::state::{BatchProgress, BatchState};
use crate::assemble::{
    ArchiveAssembler, DocumentAssembler, OutputArtifact, OutputContainer, decode_page,
};
use crate::download::filename::artifact_base_name;
use crate::download::{FetchError, HttpClient, PageFetcher};
use crate::manifest::{Manifest, Page};
use crate::range::{self, RangeRequest, ResolvedRange};
use crate::transform::{TransformParameters, build_url};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 32;

/// Default number of page fetches in flight.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Tunables for a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum page fetches in flight at once.
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Everything one run needs, fixed before the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// Address of the IIIF presentation manifest.
    pub manifest_url: String,
    /// Rendition tokens applied to every page.
    pub params: TransformParameters,
    /// 1-based page bounds as entered.
    pub range: RangeRequest,
    /// Container to assemble.
    pub container: OutputContainer,
}

impl BatchRequest {
    /// Creates a request for the whole manifest in default rendition, as a zip.
    pub fn new(manifest_url: impl Into<String>) -> Self {
        Self {
            manifest_url: manifest_url.into(),
            params: TransformParameters::default(),
            range: RangeRequest::full(),
            container: OutputContainer::default(),
        }
    }

    /// Sets the rendition tokens.
    #[must_use]
    pub fn with_params(mut self, params: TransformParameters) -> Self {
        self.params = params;
        self
    }

    /// Sets the page bounds.
    #[must_use]
    pub fn with_range(mut self, range: RangeRequest) -> Self {
        self.range = range;
        self
    }

    /// Sets the output container.
    #[must_use]
    pub fn with_container(mut self, container: OutputContainer) -> Self {
        self.container = container;
        self
    }
}

/// A page left out of an archive.
#[derive(Debug)]
pub struct PageFailure {
    /// 0-based manifest index.
    pub index: usize,
    /// Rendition URL that was requested; `None` when no URL could be built.
    pub url: Option<String>,
    /// Why the fetch failed.
    pub error: FetchError,
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct BatchReport {
    /// The finished artifact.
    pub artifact: OutputArtifact,
    /// The clamped range that was processed.
    pub range: ResolvedRange,
    /// Archive pages skipped after a failed fetch, ascending by index.
    /// Always empty for documents.
    pub omitted: Vec<PageFailure>,
}

/// Drives one manifest through fetch and assembly.
///
/// Archive runs tolerate individual page failures; document runs abort on
/// the first one. In both cases at most `concurrency` page fetches are in
/// flight, and the assembler is only touched from the controller's own task.
pub struct BatchController {
    client: HttpClient,
    fetcher: Arc<dyn PageFetcher>,
    options: BatchOptions,
    progress: Arc<BatchProgress>,
}

impl fmt::Debug for BatchController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchController")
            .field("options", &self.options)
            .field("state", &self.progress.state())
            .finish_non_exhaustive()
    }
}

impl BatchController {
    /// Creates a controller that fetches manifest and pages with `client`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConcurrency`] if the concurrency is
    /// outside `1..=32`.
    pub fn new(client: HttpClient, options: BatchOptions) -> Result<Self, BatchError> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(client.clone());
        Self::with_fetcher(client, fetcher, options)
    }

    /// Creates a controller that fetches pages through `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConcurrency`] if the concurrency is
    /// outside `1..=32`.
    #[instrument(level = "debug", skip(client, fetcher))]
    pub fn with_fetcher(
        client: HttpClient,
        fetcher: Arc<dyn PageFetcher>,
        options: BatchOptions,
    ) -> Result<Self, BatchError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&options.concurrency) {
            return Err(BatchError::InvalidConcurrency {
                value: options.concurrency,
            });
        }

        debug!(concurrency = options.concurrency, "creating batch controller");

        Ok(Self {
            client,
            fetcher,
            options,
            progress: Arc::new(BatchProgress::new()),
        })
    }

    /// Configured options.
    #[must_use]
    pub fn options(&self) -> BatchOptions {
        self.options
    }

    /// Live progress of the current or last run.
    #[must_use]
    pub fn progress(&self) -> Arc<BatchProgress> {
        Arc::clone(&self.progress)
    }

    /// Runs one batch to a terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Manifest`] if the manifest is unusable, and for
    /// documents [`BatchError::Fetch`] or [`BatchError::Decode`] on the first
    /// failed page. [`BatchError::Assemble`] covers container write failures.
    #[instrument(skip(self, request), fields(manifest = %request.manifest_url, container = request.container.extension()))]
    pub async fn run(&self, request: &BatchRequest) -> Result<BatchReport, BatchError> {
        self.progress.reset(0);
        self.transition(BatchState::FetchingManifest);

        let result = match Manifest::fetch(&self.client, &request.manifest_url).await {
            Ok(manifest) => self.process(&manifest, request).await,
            Err(e) => Err(BatchError::from(e)),
        };

        self.finish(result)
    }

    /// Runs the post-manifest stages against an already parsed manifest.
    pub(crate) async fn process(
        &self,
        manifest: &Manifest,
        request: &BatchRequest,
    ) -> Result<BatchReport, BatchError> {
        let range = range::resolve(manifest.page_count(), request.range);
        self.progress.reset(range.len());
        self.transition(BatchState::RangeResolved);
        info!(
            page_count = manifest.page_count(),
            start_index = range.start_index(),
            stop_index = ?range.last_processed(),
            pages = range.len(),
            "page range resolved"
        );

        let base_name = artifact_base_name(&request.manifest_url);
        let pages = manifest.pages().get(range.indices()).unwrap_or_default();

        self.transition(BatchState::FetchingPages);
        let (artifact, omitted) = match request.container {
            OutputContainer::Zip => {
                self.assemble_archive(base_name, pages, &request.params)
                    .await?
            }
            OutputContainer::Pdf => {
                let artifact = self
                    .assemble_document(base_name, &range, pages, &request.params)
                    .await?;
                (artifact, Vec::new())
            }
        };

        Ok(BatchReport {
            artifact,
            range,
            omitted,
        })
    }

    fn finish(
        &self,
        result: Result<BatchReport, BatchError>,
    ) -> Result<BatchReport, BatchError> {
        match &result {
            Ok(report) => {
                self.transition(BatchState::Done);
                info!(
                    file = report.artifact.suggested_file_name(),
                    bytes = report.artifact.bytes().len(),
                    completed = self.progress.completed(),
                    omitted = report.omitted.len(),
                    "batch complete"
                );
            }
            Err(e) => {
                self.transition(BatchState::Failed);
                error!(error = %e, "batch failed");
            }
        }
        result
    }

    async fn assemble_archive(
        &self,
        base_name: String,
        pages: &[Page],
        params: &TransformParameters,
    ) -> Result<(OutputArtifact, Vec<PageFailure>), BatchError> {
        let mut assembler = ArchiveAssembler::start(base_name, params.format.as_str());
        let mut omitted = Vec::new();

        let mut fetches = stream::iter(pages)
            .map(|page| async move {
                match build_url(page, params) {
                    Ok(url) => {
                        let result = self.fetcher.fetch(page.index, &url).await;
                        (page, Some(url), result)
                    }
                    Err(e) => (page, None, Err(e)),
                }
            })
            .buffer_unordered(self.options.concurrency);

        while let Some((page, url, result)) = fetches.next().await {
            match result {
                Ok(fetched) => {
                    self.progress.increment_completed();
                    assembler.add_page(fetched, &page.label);
                }
                Err(error) => {
                    self.progress.increment_failed();
                    warn!(
                        index = page.index,
                        url = url.as_deref().unwrap_or("-"),
                        error = %error,
                        "page fetch failed; omitted from archive"
                    );
                    omitted.push(PageFailure {
                        index: page.index,
                        url,
                        error,
                    });
                }
            }
        }
        drop(fetches);

        self.transition(BatchState::Assembling);
        let artifact = assembler.finalize().await.map_err(BatchError::assemble)?;
        omitted.sort_by_key(|failure| failure.index);

        if !omitted.is_empty() {
            warn!(
                omitted = omitted.len(),
                indices = ?omitted.iter().map(|f| f.index).collect::<Vec<_>>(),
                "archive is missing pages"
            );
        }

        Ok((artifact, omitted))
    }

    async fn assemble_document(
        &self,
        base_name: String,
        range: &ResolvedRange,
        pages: &[Page],
        params: &TransformParameters,
    ) -> Result<OutputArtifact, BatchError> {
        let mut assembler = DocumentAssembler::start(base_name, range);
        let mut reorder = ReorderBuffer::new(range.start_index());

        let mut fetches = stream::iter(pages)
            .map(|page| async move {
                let url = build_url(page, params).map_err(|e| BatchError::fetch(page.index, e))?;
                let fetched = self
                    .fetcher
                    .fetch(page.index, &url)
                    .await
                    .map_err(|e| BatchError::fetch(page.index, e))?;
                decode_page(fetched).await.map_err(BatchError::decode)
            })
            .buffer_unordered(self.options.concurrency);

        while let Some(result) = fetches.next().await {
            let decoded = match result {
                Ok(decoded) => decoded,
                Err(e) => {
                    self.progress.increment_failed();
                    return Err(e);
                }
            };
            self.progress.increment_completed();

            reorder.push(decoded.index, decoded);
            for page in reorder.pop_ready() {
                assembler.add_page(page).map_err(BatchError::assemble)?;
            }
            if reorder.pending() > 0 {
                debug!(
                    waiting_on = reorder.next_index(),
                    held = reorder.pending(),
                    "holding pages until earlier ones arrive"
                );
            }
        }
        drop(fetches);

        self.transition(BatchState::Assembling);
        assembler.finalize().await.map_err(BatchError::assemble)
    }

    fn transition(&self, state: BatchState) {
        let from = self.progress.state();
        self.progress.set_state(state);
        info!(from = from.as_str(), to = state.as_str(), "batch state");
    }
}
