use crate::error::OcrError;
use image::DynamicImage;

/// Collapse colour channels to a single intensity channel
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    Ok(DynamicImage::ImageLuma8(image.to_luma8()))
}
