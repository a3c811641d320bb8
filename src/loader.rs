//! Upload decoding
//!
//! Sniffs the format from the byte stream, rejects anything outside the
//! supported set and returns the image in the canonical RGB working space.

use crate::error::OcrError;
use image::{DynamicImage, GenericImageView, ImageFormat};

/// Formats accepted for upload
pub const SUPPORTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
];

/// MIME types matching [`SUPPORTED_FORMATS`]
pub const SUPPORTED_MIME_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/bmp", "image/tiff"];

/// Decode an uploaded byte stream into an RGB pixel array
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, OcrError> {
    let format = image::guess_format(bytes)
        .map_err(|e| OcrError::DecodeError(format!("Unrecognized image data: {}", e)))?;

    if !SUPPORTED_FORMATS.contains(&format) {
        return Err(OcrError::DecodeError(format!(
            "Unsupported image format: {:?} (expected PNG, JPEG, BMP or TIFF)",
            format
        )));
    }

    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| OcrError::DecodeError(e.to_string()))?;

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(OcrError::DecodeError(format!(
            "Image has no pixels ({}x{})",
            width, height
        )));
    }

    tracing::debug!(?format, width, height, "Decoded upload");

    Ok(DynamicImage::ImageRgb8(image.into_rgb8()))
}
