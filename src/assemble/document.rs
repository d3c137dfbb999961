//! PDF document assembly.
//!
//! Each decoded image becomes one page whose media box matches the image's
//! pixel dimensions, with the image drawn at the origin covering the page.
//! Pages are appended sequentially, so the assembler only accepts the next
//! expected index and refuses to finalize a truncated document.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

use super::decode::DecodedPage;
use super::error::AssembleError;
use super::{OutputArtifact, OutputContainer};
use crate::range::ResolvedRange;

/// Resource name of the page image inside each page's XObject dictionary.
const IMAGE_RESOURCE: &str = "Im0";

/// Builds a PDF from pages supplied in ascending index order.
///
/// Pages are validated and queued as they arrive; the page tree is written
/// once, on the blocking pool, when the document is finalized.
#[derive(Debug)]
pub struct DocumentAssembler {
    base_name: String,
    pages: Vec<DecodedPage>,
    next_index: usize,
    end: usize,
    expected: usize,
}

impl DocumentAssembler {
    /// Starts an empty document expecting every index of `range`.
    pub fn start(base_name: impl Into<String>, range: &ResolvedRange) -> Self {
        let indices = range.indices();
        Self {
            base_name: base_name.into(),
            pages: Vec::with_capacity(range.len()),
            next_index: indices.start,
            end: indices.end,
            expected: range.len(),
        }
    }

    /// Next index the document will accept, or `None` once complete.
    #[must_use]
    pub fn next_expected(&self) -> Option<usize> {
        (self.next_index < self.end).then_some(self.next_index)
    }

    /// Whether the last expected page has been added.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.next_expected().is_none()
    }

    /// Pages added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no page has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Appends one page sized to the image.
    ///
    /// # Errors
    ///
    /// Returns [`AssembleError::OutOfOrder`] unless `page.index` is the next
    /// expected index.
    pub fn add_page(&mut self, page: DecodedPage) -> Result<(), AssembleError> {
        if self.next_expected() != Some(page.index) {
            return Err(AssembleError::OutOfOrder {
                expected: self.next_index,
                actual: page.index,
            });
        }

        self.next_index += 1;
        debug!(
            index = page.index,
            width = page.width,
            height = page.height,
            complete = self.is_complete(),
            "document page added"
        );
        self.pages.push(page);
        Ok(())
    }

    /// Writes the page tree and serialises the document.
    ///
    /// # Errors
    ///
    /// Returns [`AssembleError::Incomplete`] if expected pages are missing,
    /// [`AssembleError::Document`] if serialisation fails, and
    /// [`AssembleError::Task`] if the blocking task is lost.
    pub async fn finalize(self) -> Result<OutputArtifact, AssembleError> {
        if !self.is_complete() {
            return Err(AssembleError::Incomplete {
                expected: self.expected,
                added: self.pages.len(),
            });
        }

        let Self {
            base_name, pages, ..
        } = self;
        let page_count = pages.len();

        let bytes = tokio::task::spawn_blocking(move || write_pdf(pages)).await??;

        debug!(pages = page_count, bytes = bytes.len(), "document finalized");
        Ok(OutputArtifact::new(bytes, &base_name, OutputContainer::Pdf))
    }
}

fn write_pdf(pages: Vec<DecodedPage>) -> Result<Vec<u8>, lopdf::Error> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let page_id = add_image_page(&mut document, pages_id, page)?;
        kids.push(Object::from(page_id));
    }

    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Adds the image, its drawing content, and the page object; returns the page id.
fn add_image_page(
    document: &mut Document,
    pages_id: ObjectId,
    page: DecodedPage,
) -> Result<ObjectId, lopdf::Error> {
    let width = Object::Integer(i64::from(page.width));
    let height = Object::Integer(i64::from(page.height));
    let zero = Object::Integer(0);

    let image_id = document.add_object(page.image.into_stream(page.width, page.height));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.clone(),
                    zero.clone(),
                    zero.clone(),
                    height.clone(),
                    zero.clone(),
                    zero.clone(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = document.add_object(Stream::new(Dictionary::new(), content.encode()?));

    let mut xobjects = Dictionary::new();
    xobjects.set(IMAGE_RESOURCE, image_id);

    Ok(document.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![zero.clone(), zero, width, height],
        "Contents" => content_id,
        "Resources" => dictionary! { "XObject" => xobjects },
    }))
}
