use crate::error::OcrError;
use image::DynamicImage;

/// Convert back to 3-channel RGB regardless of what earlier steps produced,
/// so previews and the OCR engine always see the same layout.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    match image {
        rgb @ DynamicImage::ImageRgb8(_) => Ok(rgb),
        other => Ok(DynamicImage::ImageRgb8(other.into_rgb8())),
    }
}
