use crate::error::OcrError;
use image::DynamicImage;

/// Rotate clockwise by a multiple of 90 degrees.
///
/// Pixels are moved, never resampled, so the result is lossless. An angle of
/// 0 returns the input untouched.
pub fn apply(image: DynamicImage, angle: u32) -> Result<DynamicImage, OcrError> {
    match angle {
        0 => Ok(image),
        90 => Ok(image.rotate90()),
        180 => Ok(image.rotate180()),
        270 => Ok(image.rotate270()),
        other => Err(OcrError::PreprocessingError(format!(
            "rotate90: angle {} is not one of 0, 90, 180, 270",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, GrayImage, Luma};

    fn marked_image() -> DynamicImage {
        let mut img = GrayImage::from_pixel(6, 3, Luma([255]));
        img.put_pixel(0, 0, Luma([0]));
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let img = marked_image();
        let result = apply(img.clone(), 0).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_rotate_90_swaps_dimensions_clockwise() {
        let result = apply(marked_image(), 90).unwrap();
        assert_eq!(result.dimensions(), (3, 6));
        // Top-left corner moves to the top-right
        assert_eq!(result.as_luma8().unwrap().get_pixel(2, 0).0[0], 0);
    }

    #[test]
    fn test_rotate_90_four_times_restores_image() {
        let original = marked_image();
        let mut img = original.clone();
        for _ in 0..4 {
            img = apply(img, 90).unwrap();
        }
        assert_eq!(img.dimensions(), original.dimensions());
        assert_eq!(img, original);
    }

    #[test]
    fn test_rotate_180_matches_two_quarter_turns() {
        let twice = apply(apply(marked_image(), 90).unwrap(), 90).unwrap();
        assert_eq!(apply(marked_image(), 180).unwrap(), twice);
    }

    #[test]
    fn test_rotate_rejects_other_angles() {
        for angle in [45, 360, 91] {
            let err = apply(marked_image(), angle).unwrap_err();
            assert!(matches!(err, OcrError::PreprocessingError(_)));
        }
    }
}
