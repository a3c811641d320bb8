use crate::error::OcrError;
use image::DynamicImage;

/// Trait that all OCR engines must implement
///
/// Engines classify their own failures: a missing binary is
/// `EngineUnavailable`, an engine-reported failure is `EngineProcessing`,
/// an exceeded time budget is `EngineTimeout`.
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "tesseract", "ocrs")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Query the engine for its version
    fn version(&self) -> Result<String, OcrError>;

    /// Extract text from an image, returned exactly as the engine produced it
    fn image_to_string(&self, image: &DynamicImage) -> Result<String, OcrError>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}

/// Outcome of a successful extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Non-blank text, verbatim from the engine
    Text(String),
    /// The engine ran but found nothing but whitespace
    NoText,
}

impl Extraction {
    pub fn from_engine_output(text: String) -> Self {
        if text.trim().is_empty() {
            Self::NoText
        } else {
            Self::Text(text)
        }
    }
}
