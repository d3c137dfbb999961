//! Image API transformation parameters and page URL synthesis.

use crate::download::FetchError;
use crate::manifest::Page;

/// Region/size/rotation/quality/format tokens for one batch.
///
/// Tokens are opaque: the image service validates them, this crate only
/// places them in the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformParameters {
    /// Region of the full image, e.g. `full` or `0,0,1000,1000`.
    pub region: String,
    /// Requested size, e.g. `full`, `max` or `800,`.
    pub size: String,
    /// Rotation in degrees, optionally `!`-prefixed for mirroring.
    pub rotation: String,
    /// Quality, e.g. `default`, `color`, `gray`, `bitonal`.
    pub quality: String,
    /// Output format extension, e.g. `jpg` or `png`.
    pub format: String,
}

impl Default for TransformParameters {
    fn default() -> Self {
        Self {
            region: "full".to_string(),
            size: "full".to_string(),
            rotation: "0".to_string(),
            quality: "default".to_string(),
            format: "jpg".to_string(),
        }
    }
}

/// Builds the rendition URL for one page.
///
/// `{image_service_id}/{region}/{size}/{rotation}/{quality}.{format}`
///
/// # Errors
///
/// Returns [`FetchError::MissingImageService`] if the page's canvas has no
/// image service identifier.
pub fn build_url(page: &Page, params: &TransformParameters) -> Result<String, FetchError> {
    let service_id = page
        .image_service_id
        .as_deref()
        .ok_or_else(|| FetchError::missing_image_service(page.index))?;
    Ok(format!(
        "{}/{}/{}/{}/{}.{}",
        service_id, params.region, params.size, params.rotation, params.quality, params.format
    ))
}
