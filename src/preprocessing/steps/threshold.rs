use crate::error::OcrError;
use crate::preprocessing::config::THRESHOLD_LEVEL_RANGE;
use image::{DynamicImage, GrayImage, Luma};

/// Binarize a single-channel image against a fixed level.
///
/// Pixels strictly above `level` become white, everything else black.
/// Multi-channel input is rejected rather than converted: thresholding only
/// makes sense after the grayscale step has run.
pub fn apply(image: DynamicImage, level: u32) -> Result<DynamicImage, OcrError> {
    if !THRESHOLD_LEVEL_RANGE.contains(&level) {
        return Err(OcrError::PreprocessingError(format!(
            "threshold: level {} is outside {}..={}",
            level,
            THRESHOLD_LEVEL_RANGE.start(),
            THRESHOLD_LEVEL_RANGE.end()
        )));
    }

    let color = image.color();
    let DynamicImage::ImageLuma8(gray) = image else {
        return Err(OcrError::PreprocessingError(format!(
            "threshold: requires a single-channel image but got {:?} with {} channels (enable grayscale first)",
            color,
            color.channel_count()
        )));
    };

    Ok(DynamicImage::ImageLuma8(binarize(&gray, level as u8)))
}

fn binarize(img: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y).0[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_threshold_binarizes_image() {
        let img = GrayImage::from_fn(50, 50, |x, _| Luma([(x as u8 * 5).min(255)]));

        let result = apply(DynamicImage::ImageLuma8(img), 100).unwrap();

        for pixel in result.as_luma8().unwrap().pixels() {
            assert!(
                pixel.0[0] == 0 || pixel.0[0] == 255,
                "Expected binary pixel, got {}",
                pixel.0[0]
            );
        }
    }

    #[test]
    fn test_threshold_level_is_exclusive() {
        let mut img = GrayImage::from_pixel(3, 1, Luma([200]));
        img.put_pixel(1, 0, Luma([201]));
        img.put_pixel(2, 0, Luma([199]));

        let result = apply(DynamicImage::ImageLuma8(img), 200).unwrap();
        let gray = result.as_luma8().unwrap();

        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
        assert_eq!(gray.get_pixel(1, 0).0[0], 255);
        assert_eq!(gray.get_pixel(2, 0).0[0], 0);
    }

    #[test]
    fn test_threshold_rejects_color_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        let err = apply(img, 200).unwrap_err();
        assert!(matches!(err, OcrError::PreprocessingError(_)));
        assert!(err.to_string().contains("single-channel"));
    }

    #[test]
    fn test_threshold_rejects_out_of_range_level() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        let err = apply(img, 256).unwrap_err();
        assert!(matches!(err, OcrError::PreprocessingError(_)));
    }

    #[test]
    fn test_threshold_handles_text_pattern() {
        let mut img = GrayImage::from_pixel(50, 20, Luma([240]));
        for x in 10..40 {
            img.put_pixel(x, 10, Luma([20])); // dark text
        }

        let result = apply(DynamicImage::ImageLuma8(img), 200).unwrap();
        let result_gray = result.as_luma8().unwrap();

        assert_eq!(result_gray.get_pixel(25, 10).0[0], 0);
        assert_eq!(result_gray.get_pixel(25, 5).0[0], 255);
    }
}
