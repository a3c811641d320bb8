//! OCR invocation
//!
//! Checks that the engine can be reached and runs extractions, sorting every
//! failure into the categories clients are shown. Nothing here retries.

use crate::engine::{Extraction, OcrEngine};
use crate::error::OcrError;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct OcrInvoker {
    engine: Arc<dyn OcrEngine>,
}

impl OcrInvoker {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &dyn OcrEngine {
        self.engine.as_ref()
    }

    /// Ask the engine for its version. Any error is fatal for the session.
    pub fn check_availability(&self) -> Result<String, OcrError> {
        match self.engine.version() {
            Ok(version) if version.trim().is_empty() => Err(OcrError::EngineUnavailable(format!(
                "{} did not report a version, it is probably not installed",
                self.engine.name()
            ))),
            Ok(version) => {
                tracing::info!(engine = self.engine.name(), %version, "OCR engine available");
                Ok(version)
            }
            Err(e @ OcrError::EngineUnavailable(_)) | Err(e @ OcrError::Unexpected(_)) => {
                tracing::error!(engine = self.engine.name(), "OCR engine check failed: {}", e);
                Err(e)
            }
            Err(other) => {
                tracing::error!(engine = self.engine.name(), "OCR engine check failed: {}", other);
                Err(OcrError::Unexpected(other.to_string()))
            }
        }
    }

    /// Run one extraction on the final preprocessed image
    pub fn extract(&self, image: &DynamicImage) -> Result<Extraction, OcrError> {
        let start = Instant::now();

        let text = self
            .engine
            .image_to_string(image)
            .map_err(classify_extraction_error)?;

        let extraction = Extraction::from_engine_output(text);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &extraction {
            Extraction::Text(text) => tracing::info!(
                engine = self.engine.name(),
                elapsed_ms,
                chars = text.chars().count(),
                "Text extracted"
            ),
            Extraction::NoText => tracing::warn!(
                engine = self.engine.name(),
                elapsed_ms,
                "No text was extracted"
            ),
        }

        Ok(extraction)
    }
}

/// Keep the four engine categories, fold anything else into `Unexpected`
fn classify_extraction_error(error: OcrError) -> OcrError {
    match error {
        OcrError::EngineProcessing(_)
        | OcrError::EngineUnavailable(_)
        | OcrError::EngineTimeout(_)
        | OcrError::Unexpected(_) => error,
        other => OcrError::Unexpected(other.to_string()),
    }
}
