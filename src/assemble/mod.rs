//! Assembly of fetched pages into a single downloadable artifact.
//!
//! Two containers are supported:
//! - [`ArchiveAssembler`]: a zip of the individual page files, order-independent
//! - [`DocumentAssembler`]: a PDF with one page per image, strictly in index order
//!
//! Both finalize an empty input into a valid, empty artifact.

mod archive;
mod decode;
mod document;
mod error;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::download::filename::{artifact_file_name, resolve_unique_path};

pub use archive::ArchiveAssembler;
pub use decode::{DecodedPage, decode_page};
pub use document::DocumentAssembler;
pub use error::{AssembleError, DecodeError};

/// Container format requested for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputContainer {
    /// Zip archive of individual page images.
    #[default]
    Zip,
    /// Single paginated PDF document.
    Pdf,
}

impl OutputContainer {
    /// Maps a download-format token: `"zip"` is the archive, anything else the document.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("zip") {
            Self::Zip
        } else {
            Self::Pdf
        }
    }

    /// File extension of the container.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Pdf => "pdf",
        }
    }

    /// MIME type of the container.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Zip => "application/zip",
            Self::Pdf => "application/pdf",
        }
    }
}

/// A finished artifact ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    bytes: Vec<u8>,
    suggested_file_name: String,
    mime_type: &'static str,
}

impl OutputArtifact {
    pub(crate) fn new(bytes: Vec<u8>, base_name: &str, container: OutputContainer) -> Self {
        Self {
            bytes,
            suggested_file_name: artifact_file_name(base_name, container.extension()),
            mime_type: container.mime_type(),
        }
    }

    /// Artifact content.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the artifact, returning its content.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// File name derived from the manifest name and container extension.
    #[must_use]
    pub fn suggested_file_name(&self) -> &str {
        &self.suggested_file_name
    }

    /// MIME type of the content.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Writes the artifact into `dir` without overwriting existing files.
    ///
    /// # Errors
    ///
    /// Returns the IO error if the file cannot be written.
    pub async fn save_to_dir(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = resolve_unique_path(dir, &self.suggested_file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        info!(path = %path.display(), bytes = self.bytes.len(), "artifact saved");
        Ok(path)
    }
}
