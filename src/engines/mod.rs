//! OCR engine implementations
//!
//! This module contains implementations of the OcrEngine trait for different
//! OCR backends. Engines are conditionally compiled based on feature flags.

#[cfg(feature = "engine-tesseract")]
pub mod tesseract;

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::OcrError;
use image::DynamicImage;
use std::sync::Arc;

/// Selectable OCR backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EngineKind {
    /// System tesseract executable
    Tesseract,
    /// Embedded ocrs models
    Ocrs,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tesseract => "tesseract",
            Self::Ocrs => "ocrs",
        }
    }
}

/// Build the configured engine.
///
/// A backend that is not compiled in, or fails to initialize, is replaced by
/// an [`UnavailableEngine`] so every session reports the reason instead of
/// the server refusing to start.
pub fn create(config: &Config) -> Arc<dyn OcrEngine> {
    match build(config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("OCR engine '{}' unavailable: {}", config.engine.as_str(), e);
            Arc::new(UnavailableEngine {
                name: config.engine.as_str(),
                reason: e,
            })
        }
    }
}

fn build(config: &Config) -> Result<Arc<dyn OcrEngine>, OcrError> {
    match config.engine {
        #[cfg(feature = "engine-tesseract")]
        EngineKind::Tesseract => {
            tracing::info!(
                "Using tesseract engine ({})",
                config.tesseract_cmd.display()
            );
            Ok(Arc::new(tesseract::TesseractEngine::new(config)))
        }
        #[cfg(feature = "engine-ocrs")]
        EngineKind::Ocrs => Ok(Arc::new(ocrs::OcrsEngine::new()?)),
        #[allow(unreachable_patterns)]
        other => Err(OcrError::EngineUnavailable(format!(
            "engine '{}' is not compiled in. Build with --features engine-{}",
            other.as_str(),
            other.as_str()
        ))),
    }
}

/// Stand-in for an engine that could not be constructed
struct UnavailableEngine {
    name: &'static str,
    reason: OcrError,
}

impl OcrEngine for UnavailableEngine {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "Engine failed to initialize"
    }

    fn version(&self) -> Result<String, OcrError> {
        Err(self.reason.clone())
    }

    fn image_to_string(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        Err(self.reason.clone())
    }

    fn supported_languages(&self) -> Vec<String> {
        Vec::new()
    }
}
