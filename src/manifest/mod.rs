//! IIIF presentation manifest retrieval and page-list extraction.
//!
//! Only the ordered page list is consumed: for each canvas at
//! `sequences[0].canvases` the label and the first image's service
//! identifier. Everything else in the document is ignored, and a canvas
//! without a usable service still counts as a page.

mod error;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::download::HttpClient;

pub use error::ManifestError;

/// One page of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 0-based position in the manifest.
    pub index: usize,
    /// Display label; may be empty.
    pub label: String,
    /// Base identifier of the image service for this page, if the canvas has one.
    pub image_service_id: Option<String>,
}

/// The ordered page list of one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    url: String,
    pages: Vec<Page>,
}

impl Manifest {
    /// Retrieves and parses the manifest at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Fetch`] on transport or non-2xx failures and
    /// the parse variants of [`ManifestError`] for unusable bodies.
    #[instrument(skip(client), fields(url = %url))]
    pub async fn fetch(client: &HttpClient, url: &str) -> Result<Self, ManifestError> {
        let body = client.get_bytes(url).await.map_err(ManifestError::fetch)?;
        let manifest = Self::from_slice(url, &body.bytes)?;
        debug!(pages = manifest.page_count(), "manifest parsed");
        Ok(manifest)
    }

    /// Parses a manifest body.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Parse`] for invalid JSON and
    /// [`ManifestError::MissingPages`] when there is no page list.
    pub fn from_slice(url: &str, bytes: &[u8]) -> Result<Self, ManifestError> {
        let raw: RawManifest =
            serde_json::from_slice(bytes).map_err(|e| ManifestError::parse(url, e))?;

        let canvases = raw
            .sequences
            .and_then(|sequences| sequences.into_iter().next())
            .and_then(|sequence| sequence.canvases)
            .ok_or_else(|| ManifestError::missing_pages(url))?;

        let pages: Vec<Page> = canvases
            .into_iter()
            .enumerate()
            .map(|(index, canvas)| Page {
                index,
                label: label_text(&canvas.label),
                image_service_id: canvas
                    .images
                    .into_iter()
                    .next()
                    .and_then(|image| image.resource)
                    .and_then(|resource| resource.service)
                    .and_then(ServiceRef::into_id),
            })
            .collect();

        let without_service = pages
            .iter()
            .filter(|page| page.image_service_id.is_none())
            .count();
        if without_service > 0 {
            debug!(pages = without_service, "canvases without an image service");
        }

        Ok(Self {
            url: url.to_string(),
            pages,
        })
    }

    /// URL the manifest was read from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of pages in manifest order.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pages in manifest order.
    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page at a 0-based index.
    #[must_use]
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    sequences: Option<Vec<RawSequence>>,
}

#[derive(Debug, Deserialize)]
struct RawSequence {
    #[serde(default)]
    canvases: Option<Vec<RawCanvas>>,
}

#[derive(Debug, Deserialize)]
struct RawCanvas {
    #[serde(default)]
    label: Value,
    #[serde(default)]
    images: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    #[serde(default)]
    resource: Option<RawResource>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    #[serde(default)]
    service: Option<ServiceRef>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    #[serde(rename = "@id", alias = "id", default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServiceRef {
    Id(String),
    One(RawService),
    Many(Vec<RawService>),
}

impl ServiceRef {
    fn into_id(self) -> Option<String> {
        let id = match self {
            Self::Id(id) => Some(id),
            Self::One(service) => service.id,
            Self::Many(services) => services.into_iter().find_map(|service| service.id),
        };
        id.map(|id| id.trim_end_matches('/').to_string())
            .filter(|id| !id.is_empty())
    }
}

/// Flattens the label shapes seen in the wild to plain text.
fn label_text(label: &Value) -> String {
    match label {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Object(map) => map.get("@value").map(label_text).unwrap_or_default(),
        Value::Array(values) => values.first().map(label_text).unwrap_or_default(),
        Value::Null | Value::Bool(_) => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://example.org/iiif/book1/manifest";

    fn canvas(label: Value, service: Value) -> Value {
        json!({
            "@type": "sc:Canvas",
            "label": label,
            "images": [{ "resource": { "service": service } }]
        })
    }

    fn manifest_bytes(canvases: Vec<Value>) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "@context": "http://iiif.io/api/presentation/2/context.json",
            "label": "Book 1",
            "sequences": [{ "canvases": canvases }]
        }))
        .unwrap()
    }

    #[test]
    fn test_from_slice_reads_pages_in_order() {
        let bytes = manifest_bytes(vec![
            canvas(json!("1r"), json!({ "@id": "https://img/p1" })),
            canvas(json!("1v"), json!({ "@id": "https://img/p2" })),
        ]);
        let manifest = Manifest::from_slice(URL, &bytes).unwrap();
        assert_eq!(manifest.page_count(), 2);
        assert_eq!(manifest.url(), URL);
        assert_eq!(
            manifest.pages()[1],
            Page {
                index: 1,
                label: "1v".to_string(),
                image_service_id: Some("https://img/p2".to_string()),
            }
        );
    }

    #[test]
    fn test_from_slice_accepts_label_variants() {
        let bytes = manifest_bytes(vec![
            canvas(json!(7), json!({ "@id": "a" })),
            canvas(json!({ "@value": "f. 2", "@language": "en" }), json!({ "@id": "b" })),
            canvas(json!(["first", "second"]), json!({ "@id": "c" })),
            canvas(Value::Null, json!({ "@id": "d" })),
        ]);
        let manifest = Manifest::from_slice(URL, &bytes).unwrap();
        let labels: Vec<&str> = manifest.pages().iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["7", "f. 2", "first", ""]);
    }

    #[test]
    fn test_from_slice_accepts_service_variants() {
        let bytes = manifest_bytes(vec![
            canvas(json!("a"), json!([{ "profile": "x" }, { "@id": "https://img/p1/" }])),
            canvas(json!("b"), json!({ "id": "https://img/p2" })),
            canvas(json!("c"), json!("https://img/p3")),
        ]);
        let manifest = Manifest::from_slice(URL, &bytes).unwrap();
        let ids: Vec<&str> = manifest
            .pages()
            .iter()
            .filter_map(|p| p.image_service_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["https://img/p1", "https://img/p2", "https://img/p3"]);
    }

    #[test]
    fn test_from_slice_empty_canvases_is_zero_pages() {
        let manifest = Manifest::from_slice(URL, &manifest_bytes(vec![])).unwrap();
        assert_eq!(manifest.page_count(), 0);
        assert!(manifest.page(0).is_none());
    }

    #[test]
    fn test_from_slice_missing_sequences_is_missing_pages() {
        let err = Manifest::from_slice(URL, br#"{"label": "x"}"#).unwrap_err();
        assert!(matches!(err, ManifestError::MissingPages { .. }));

        let err = Manifest::from_slice(URL, br#"{"sequences": []}"#).unwrap_err();
        assert!(matches!(err, ManifestError::MissingPages { .. }));
    }

    #[test]
    fn test_from_slice_keeps_canvases_without_service() {
        let bytes = manifest_bytes(vec![
            canvas(json!("a"), json!({ "@id": "https://img/p1" })),
            json!({ "label": "b", "images": [] }),
            json!({ "label": "c", "images": [{ "resource": { "@id": "https://img/p3.jpg" } }] }),
        ]);
        let manifest = Manifest::from_slice(URL, &bytes).unwrap();
        assert_eq!(manifest.page_count(), 3);
        assert_eq!(
            manifest.page(0).unwrap().image_service_id.as_deref(),
            Some("https://img/p1")
        );
        assert_eq!(manifest.page(1).unwrap().image_service_id, None);
        assert_eq!(manifest.page(2).unwrap().label, "c");
        assert_eq!(manifest.page(2).unwrap().image_service_id, None);
    }

    #[test]
    fn test_from_slice_invalid_json_is_parse_error() {
        let err = Manifest::from_slice(URL, b"<html>not json</html>").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }
}
