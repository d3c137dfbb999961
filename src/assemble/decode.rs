//! Page image decoding for document assembly.
//!
//! Decoding yields the pixel dimensions that size the document page, plus
//! the sample payload to embed. Baseline gray/RGB JPEGs pass through unchanged;
//! everything else is converted to 8-bit samples and deflated.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use lopdf::{Dictionary, Object, Stream};
use tracing::debug;

use super::error::DecodeError;
use crate::download::FetchedPage;

/// A page decoded far enough to become one document page.
#[derive(Debug, Clone)]
pub struct DecodedPage {
    /// 0-based manifest index.
    pub index: usize,
    /// Pixel width (becomes the page width).
    pub width: u32,
    /// Pixel height (becomes the page height).
    pub height: u32,
    pub(crate) image: EmbeddedImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColorSpace {
    Gray,
    Rgb,
}

impl ColorSpace {
    fn pdf_name(self) -> &'static str {
        match self {
            Self::Gray => "DeviceGray",
            Self::Rgb => "DeviceRGB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SampleFilter {
    Dct,
    Flate,
}

impl SampleFilter {
    fn pdf_name(self) -> &'static str {
        match self {
            Self::Dct => "DCTDecode",
            Self::Flate => "FlateDecode",
        }
    }
}

/// Encoded samples plus how the PDF reader should interpret them.
#[derive(Debug, Clone)]
pub(crate) struct EmbeddedImage {
    pub(crate) filter: SampleFilter,
    pub(crate) color_space: ColorSpace,
    data: Vec<u8>,
}

impl EmbeddedImage {
    /// Builds the image XObject stream.
    pub(crate) fn into_stream(self, width: u32, height: u32) -> Stream {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(i64::from(width)));
        dict.set("Height", Object::Integer(i64::from(height)));
        dict.set(
            "ColorSpace",
            Object::Name(self.color_space.pdf_name().as_bytes().to_vec()),
        );
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set(
            "Filter",
            Object::Name(self.filter.pdf_name().as_bytes().to_vec()),
        );
        Stream::new(dict, self.data)
    }
}

/// Decodes a fetched page on the blocking pool.
///
/// # Errors
///
/// Returns [`DecodeError`] if the payload is not a readable image.
pub async fn decode_page(page: FetchedPage) -> Result<DecodedPage, DecodeError> {
    let index = page.index;
    tokio::task::spawn_blocking(move || decode_blocking(page))
        .await
        .map_err(|source| DecodeError::Task { index, source })?
}

fn decode_blocking(page: FetchedPage) -> Result<DecodedPage, DecodeError> {
    let FetchedPage {
        index,
        bytes,
        content_type,
    } = page;

    let format =
        image::guess_format(&bytes).map_err(|e| DecodeError::image(index, &content_type, e))?;
    let decoded = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| DecodeError::image(index, &content_type, e))?;
    let (width, height) = (decoded.width(), decoded.height());

    let image = match (format, decoded.color()) {
        (ImageFormat::Jpeg, ColorType::L8) => passthrough(bytes, ColorSpace::Gray),
        (ImageFormat::Jpeg, ColorType::Rgb8) => passthrough(bytes, ColorSpace::Rgb),
        _ => convert(index, &decoded)?,
    };

    debug!(
        index,
        width,
        height,
        ?format,
        filter = image.filter.pdf_name(),
        "page decoded"
    );

    Ok(DecodedPage {
        index,
        width,
        height,
        image,
    })
}

fn passthrough(bytes: Vec<u8>, color_space: ColorSpace) -> EmbeddedImage {
    EmbeddedImage {
        filter: SampleFilter::Dct,
        color_space,
        data: bytes,
    }
}

fn convert(index: usize, decoded: &DynamicImage) -> Result<EmbeddedImage, DecodeError> {
    let (samples, color_space) = if decoded.color().has_color() {
        (decoded.to_rgb8().into_raw(), ColorSpace::Rgb)
    } else {
        (decoded.to_luma8().into_raw(), ColorSpace::Gray)
    };

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&samples)
        .map_err(|source| DecodeError::Compress { index, source })?;
    let data = encoder
        .finish()
        .map_err(|source| DecodeError::Compress { index, source })?;

    Ok(EmbeddedImage {
        filter: SampleFilter::Flate,
        color_space,
        data,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::io::{Cursor, Read};

    use flate2::read::ZlibDecoder;
    use image::{GrayImage, RgbImage, RgbaImage};

    use super::*;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn jpeg_bytes(image: DynamicImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
            .unwrap();
        buffer
    }

    #[tokio::test]
    async fn test_decode_rgb_jpeg_passes_through() {
        let bytes = jpeg_bytes(DynamicImage::ImageRgb8(RgbImage::new(40, 30)));
        let page = FetchedPage::new(3, bytes.clone(), "image/jpeg");

        let decoded = decode_page(page).await.unwrap();
        assert_eq!((decoded.index, decoded.width, decoded.height), (3, 40, 30));
        assert_eq!(decoded.image.filter, SampleFilter::Dct);
        assert_eq!(decoded.image.color_space, ColorSpace::Rgb);
        assert_eq!(decoded.image.data, bytes);
    }

    #[tokio::test]
    async fn test_decode_gray_jpeg_passes_through_as_gray() {
        let bytes = jpeg_bytes(DynamicImage::ImageLuma8(GrayImage::new(12, 8)));
        let decoded = decode_page(FetchedPage::new(0, bytes, "image/jpeg"))
            .await
            .unwrap();
        assert_eq!(decoded.image.filter, SampleFilter::Dct);
        assert_eq!(decoded.image.color_space, ColorSpace::Gray);
    }

    #[tokio::test]
    async fn test_decode_png_is_converted_to_flate_rgb() {
        let decoded = decode_page(FetchedPage::new(1, png_bytes(7, 5), "image/png"))
            .await
            .unwrap();
        assert_eq!((decoded.width, decoded.height), (7, 5));
        assert_eq!(decoded.image.filter, SampleFilter::Flate);
        assert_eq!(decoded.image.color_space, ColorSpace::Rgb);
    }

    #[tokio::test]
    async fn test_decode_rgba_png_drops_alpha() {
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::new(4, 4))
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        let decoded = decode_page(FetchedPage::new(0, buffer, "image/png"))
            .await
            .unwrap();

        assert_eq!(decoded.image.filter, SampleFilter::Flate);
        assert_eq!(decoded.image.color_space, ColorSpace::Rgb);

        let mut raw = Vec::new();
        ZlibDecoder::new(decoded.image.data.as_slice())
            .read_to_end(&mut raw)
            .unwrap();
        assert_eq!(raw.len(), 4 * 4 * 3);
    }

    #[tokio::test]
    async fn test_decode_garbage_is_decode_error() {
        let page = FetchedPage::new(9, b"<html>error page</html>".to_vec(), "text/html");
        let err = decode_page(page).await.unwrap_err();
        assert_eq!(err.index(), 9);
        assert!(matches!(err, DecodeError::Image { .. }));
    }
}
