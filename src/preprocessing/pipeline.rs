use crate::error::OcrError;
use image::DynamicImage;
use serde::Serialize;
use std::time::Instant;

use super::config::PreprocessConfig;
use super::steps;

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Preprocessed image (not serialized)
    #[serde(skip)]
    pub image: DynamicImage,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Steps that ran, in order
    pub steps: Vec<StepTiming>,
}

/// Preprocessing pipeline driven by a user configuration.
///
/// Order is fixed: grayscale, denoise, threshold, rotate90, rotate_free, then
/// the unconditional conversion back to RGB. The first failing step aborts
/// the run.
pub struct Pipeline {
    config: PreprocessConfig,
}

impl Pipeline {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Process an image according to the configuration
    pub fn process(&self, image: DynamicImage) -> Result<PreprocessingResult, OcrError> {
        let start = Instant::now();
        let mut steps_timing = Vec::new();
        let config = &self.config;

        let mut img = image;

        if config.grayscale {
            img = self.run_step("grayscale", img, &mut steps_timing, steps::grayscale::apply)?;
        }

        if config.denoise {
            img = self.run_step("denoise", img, &mut steps_timing, |img| {
                steps::denoise::apply(img, config.denoise_strength)
            })?;
        }

        if config.threshold {
            img = self.run_step("threshold", img, &mut steps_timing, |img| {
                steps::threshold::apply(img, config.threshold_level)
            })?;
        }

        if config.rotate90 {
            img = self.run_step("rotate90", img, &mut steps_timing, |img| {
                steps::rotate::apply(img, config.rotate90_angle)
            })?;
        }

        if config.rotate_free {
            img = self.run_step("rotate_free", img, &mut steps_timing, |img| {
                steps::rotate_free::apply(img, config.rotate_free_angle)
            })?;
        }

        img = self.run_step("color", img, &mut steps_timing, steps::color::apply)?;

        Ok(PreprocessingResult {
            image: img,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: steps_timing,
        })
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: DynamicImage,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<DynamicImage, OcrError>
    where
        F: FnOnce(DynamicImage) -> Result<DynamicImage, OcrError>,
    {
        let step_start = Instant::now();
        let result = step_fn(img).inspect_err(|e| {
            tracing::warn!(step = name, "Preprocessing step failed: {}", e);
        })?;
        let time_ms = step_start.elapsed().as_millis() as u64;
        tracing::debug!(step = name, time_ms, "Preprocessing step finished");
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms,
        });
        Ok(result)
    }
}
