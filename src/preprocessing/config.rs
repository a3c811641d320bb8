use serde::{Deserialize, Serialize};

/// Valid range for the denoising strength
pub const DENOISE_STRENGTH_RANGE: std::ops::RangeInclusive<u32> = 1..=40;
/// Valid range for the threshold level
pub const THRESHOLD_LEVEL_RANGE: std::ops::RangeInclusive<u32> = 0..=255;
/// Valid range for free rotation, in degrees
pub const ROTATE_FREE_RANGE: std::ops::RangeInclusive<f32> = -180.0..=180.0;

/// User-selected preprocessing options, captured once per request.
///
/// Values are kept exactly as supplied. Each step validates the parameter it
/// consumes, so an out-of-range value only fails when its toggle is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub grayscale: bool,
    pub denoise: bool,
    pub denoise_strength: u32,
    pub threshold: bool,
    pub threshold_level: u32,
    pub rotate90: bool,
    /// Clockwise, one of 0/90/180/270
    pub rotate90_angle: u32,
    pub rotate_free: bool,
    /// Degrees, positive is counter-clockwise
    pub rotate_free_angle: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            grayscale: true,
            denoise: true,
            denoise_strength: 1,
            threshold: true,
            threshold_level: 200,
            rotate90: false,
            rotate90_angle: 0,
            rotate_free: false,
            rotate_free_angle: 0.0,
        }
    }
}

impl PreprocessConfig {
    /// Every toggle off: only the final colour conversion runs
    pub fn passthrough() -> Self {
        Self {
            grayscale: false,
            denoise: false,
            threshold: false,
            ..Self::default()
        }
    }
}
