use crate::error::OcrError;
use crate::preprocessing::config::ROTATE_FREE_RANGE;
use image::{DynamicImage, GenericImageView, GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

/// Slack for floating point noise when sizing the canvas
const CANVAS_EPSILON: f64 = 1e-6;

/// Rotate by an arbitrary angle in degrees, counter-clockwise for positive
/// values, onto a canvas large enough to hold every source pixel.
///
/// The canvas is the rotated bounding box but never smaller than the input
/// in either axis. Uncovered area is black.
pub fn apply(image: DynamicImage, degrees: f32) -> Result<DynamicImage, OcrError> {
    if !degrees.is_finite() || !ROTATE_FREE_RANGE.contains(&degrees) {
        return Err(OcrError::PreprocessingError(format!(
            "rotate_free: angle {} is outside {}..={}",
            degrees,
            ROTATE_FREE_RANGE.start(),
            ROTATE_FREE_RANGE.end()
        )));
    }

    if degrees == 0.0 {
        return Ok(image);
    }

    let (width, height) = image.dimensions();
    let (out_width, out_height) = grown_canvas(width, height, degrees);
    let projection = centered_rotation((width, height), (out_width, out_height), degrees);

    match image {
        DynamicImage::ImageLuma8(gray) => {
            let mut out = GrayImage::from_pixel(out_width, out_height, Luma([0]));
            warp_into(&gray, &projection, Interpolation::Bilinear, Luma([0]), &mut out);
            Ok(DynamicImage::ImageLuma8(out))
        }
        other => {
            let rgb = other.into_rgb8();
            let mut out = RgbImage::from_pixel(out_width, out_height, Rgb([0, 0, 0]));
            warp_into(&rgb, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);
            Ok(DynamicImage::ImageRgb8(out))
        }
    }
}

/// Canvas size that fits the rotated image without clipping
fn grown_canvas(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let theta = f64::from(degrees).to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let (w, h) = (f64::from(width), f64::from(height));

    let bbox_width = (w * cos + h * sin - CANVAS_EPSILON).ceil() as u32;
    let bbox_height = (w * sin + h * cos - CANVAS_EPSILON).ceil() as u32;

    (bbox_width.max(width), bbox_height.max(height))
}

/// Map source pixels so the source centre lands on the canvas centre.
///
/// `Projection::rotate` turns clockwise in image coordinates (y down), so the
/// angle is negated.
fn centered_rotation(source: (u32, u32), canvas: (u32, u32), degrees: f32) -> Projection {
    let (src_cx, src_cy) = (source.0 as f32 / 2.0, source.1 as f32 / 2.0);
    let (dst_cx, dst_cy) = (canvas.0 as f32 / 2.0, canvas.1 as f32 / 2.0);

    Projection::translate(dst_cx, dst_cy)
        * Projection::rotate(-degrees.to_radians())
        * Projection::translate(-src_cx, -src_cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brightness(img: &GrayImage) -> f64 {
        img.pixels().map(|p| p.0[0] as f64).sum::<f64>() / 255.0
    }

    #[test]
    fn test_rotate_free_never_shrinks_canvas() {
        for degrees in [-180.0, -135.0, -90.0, -33.3, -1.0, 1.0, 45.0, 90.0, 120.0, 180.0] {
            let img = DynamicImage::ImageLuma8(GrayImage::new(120, 30));
            let result = apply(img, degrees).unwrap();
            assert!(result.width() >= 120, "width shrank at {}", degrees);
            assert!(result.height() >= 30, "height shrank at {}", degrees);
        }
    }

    #[test]
    fn test_rotate_free_grows_canvas_to_bounding_box() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(100, 100));
        let result = apply(img, 45.0).unwrap();
        // 100 * sqrt(2) ~ 141.4
        assert_eq!(result.dimensions(), (142, 142));
    }

    #[test]
    fn test_rotate_free_right_angle_has_exact_canvas() {
        let (w, h) = grown_canvas(80, 40, 90.0);
        assert_eq!((w, h), (80, 80));
    }

    #[test]
    fn test_rotate_free_keeps_content() {
        let img = GrayImage::from_pixel(80, 40, Luma([255]));
        let before = brightness(&img);

        let result = apply(DynamicImage::ImageLuma8(img), 30.0).unwrap();
        let after = brightness(result.as_luma8().unwrap());

        // Only edge interpolation may lose intensity, corners are not clipped
        assert!(
            (after - before).abs() / before < 0.1,
            "before {} after {}",
            before,
            after
        );
    }

    #[test]
    fn test_rotate_free_preserves_color_layout() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([10, 200, 30])));
        let result = apply(img, 15.0).unwrap();
        assert!(result.as_rgb8().is_some());
    }

    #[test]
    fn test_rotate_free_zero_is_identity() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(7, 5, |x, y| Luma([(x * y) as u8])));
        assert_eq!(apply(img.clone(), 0.0).unwrap(), img);
    }

    #[test]
    fn test_rotate_free_rejects_out_of_range() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        for degrees in [180.5, -181.0, f32::NAN, f32::INFINITY] {
            let err = apply(img.clone(), degrees).unwrap_err();
            assert!(matches!(err, OcrError::PreprocessingError(_)));
        }
    }
}
