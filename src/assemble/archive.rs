//! Zip archive assembly.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::AssembleError;
use super::{OutputArtifact, OutputContainer};
use crate::download::FetchedPage;
use crate::download::filename::archive_entry_name;

/// Collects fetched pages as named archive entries.
///
/// Pages may arrive in any order. Entries are keyed by name, so two pages
/// whose labels produce the same name keep only the later one.
#[derive(Debug)]
pub struct ArchiveAssembler {
    base_name: String,
    format: String,
    entries: HashMap<String, FetchedPage>,
}

impl ArchiveAssembler {
    /// Starts an empty archive whose entries are named after `base_name`
    /// and given the `format` extension.
    pub fn start(base_name: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            format: format.into(),
            entries: HashMap::new(),
        }
    }

    /// Stores a page under `"{base} {label}.{format}"`.
    ///
    /// Only successfully fetched pages belong here; failed fetches are the
    /// caller's to record.
    pub fn add_page(&mut self, page: FetchedPage, label: &str) {
        let name = archive_entry_name(&self.base_name, label, &self.format);
        debug!(index = page.index, entry = %name, bytes = page.bytes.len(), "archive entry added");
        if let Some(replaced) = self.entries.insert(name.clone(), page) {
            warn!(
                entry = %name,
                replaced_index = replaced.index,
                "duplicate archive entry name; earlier page replaced"
            );
        }
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compresses all entries into one archive, written in page index order.
    ///
    /// # Errors
    ///
    /// Returns [`AssembleError::Archive`] if the zip writer fails and
    /// [`AssembleError::Task`] if the blocking task is lost.
    pub async fn finalize(self) -> Result<OutputArtifact, AssembleError> {
        let Self {
            base_name, entries, ..
        } = self;

        let mut entries: Vec<(String, FetchedPage)> = entries.into_iter().collect();
        entries.sort_by_key(|(_, page)| page.index);
        let entry_count = entries.len();

        let bytes = tokio::task::spawn_blocking(move || write_zip(entries)).await??;
        debug!(entries = entry_count, bytes = bytes.len(), "archive finalized");

        Ok(OutputArtifact::new(bytes, &base_name, OutputContainer::Zip))
    }
}

fn write_zip(entries: Vec<(String, FetchedPage)>) -> Result<Vec<u8>, zip::result::ZipError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, page) in entries {
        writer.start_file(name, options)?;
        writer.write_all(&page.bytes)?;
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Read;

    use super::*;

    fn read_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut content = Vec::new();
                file.read_to_end(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_finalize_empty_archive() {
        let assembler = ArchiveAssembler::start("book1", "jpg");
        assert!(assembler.is_empty());

        let artifact = assembler.finalize().await.unwrap();
        assert_eq!(artifact.suggested_file_name(), "book1.zip");
        assert_eq!(artifact.mime_type(), "application/zip");
        assert!(read_entries(artifact.bytes()).is_empty());
    }

    #[tokio::test]
    async fn test_entries_written_in_index_order_regardless_of_arrival() {
        let mut assembler = ArchiveAssembler::start("book1", "jpg");
        assembler.add_page(FetchedPage::new(2, b"three".to_vec(), "image/jpeg"), "3");
        assembler.add_page(FetchedPage::new(0, b"one".to_vec(), "image/jpeg"), "1");
        assembler.add_page(FetchedPage::new(1, b"two".to_vec(), "image/jpeg"), "2");
        assert_eq!(assembler.len(), 3);

        let artifact = assembler.finalize().await.unwrap();
        let entries = read_entries(artifact.bytes());
        assert_eq!(
            entries,
            vec![
                ("book1 1.jpg".to_string(), b"one".to_vec()),
                ("book1 2.jpg".to_string(), b"two".to_vec()),
                ("book1 3.jpg".to_string(), b"three".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_names_last_write_wins() {
        let mut assembler = ArchiveAssembler::start("book1", "png");
        assembler.add_page(FetchedPage::new(0, b"first".to_vec(), "image/png"), "same");
        assembler.add_page(FetchedPage::new(1, b"second".to_vec(), "image/png"), "same");
        assert_eq!(assembler.len(), 1);

        let artifact = assembler.finalize().await.unwrap();
        let entries = read_entries(artifact.bytes());
        assert_eq!(
            entries,
            vec![("book1 same.png".to_string(), b"second".to_vec())]
        );
    }
}
