//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies required.
//! Downloads neural network models into the user cache directory on first use.

use crate::engine::OcrEngine;
use crate::error::OcrError;
use image::DynamicImage;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

const DETECTION_MODEL_FILE: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILE: &str = "text-recognition.rten";

/// OCR Engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: OcrsOcrEngine,
    model_dir: PathBuf,
}

impl OcrsEngine {
    /// Load the detection and recognition models, downloading them if needed.
    ///
    /// Any failure here means the engine is not available for this process.
    pub fn new() -> Result<Self, OcrError> {
        tracing::info!("Initializing ocrs OCR engine...");

        let model_dir = model_cache_dir();
        let detection_model_path =
            ensure_model_downloaded(&model_dir, DETECTION_MODEL_URL, DETECTION_MODEL_FILE)?;
        let recognition_model_path =
            ensure_model_downloaded(&model_dir, RECOGNITION_MODEL_URL, RECOGNITION_MODEL_FILE)?;

        let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
            OcrError::EngineUnavailable(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
            OcrError::EngineUnavailable(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| OcrError::EngineUnavailable(format!("Failed to create OCR engine: {}", e)))?;

        tracing::info!("ocrs engine initialized (models in {:?})", model_dir);

        Ok(Self { engine, model_dir })
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - no system dependencies, English/Latin text only"
    }

    fn version(&self) -> Result<String, OcrError> {
        Ok(format!(
            "ocrs ({}, {} in {})",
            DETECTION_MODEL_FILE,
            RECOGNITION_MODEL_FILE,
            self.model_dir.display()
        ))
    }

    fn image_to_string(&self, image: &DynamicImage) -> Result<String, OcrError> {
        // HWC RGB8 is what ImageSource::from_bytes expects
        let rgb_img = image.to_rgb8();
        let dimensions = rgb_img.dimensions();

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            OcrError::EngineProcessing(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::EngineProcessing(format!("Failed to prepare input: {}", e)))?;

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| OcrError::EngineProcessing(format!("Failed to detect words: {}", e)))?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| OcrError::EngineProcessing(format!("Failed to recognize text: {}", e)))?;

        let text = line_texts
            .iter()
            .filter_map(|line| line.as_ref())
            .map(|line| {
                line.words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(text)
    }

    fn supported_languages(&self) -> Vec<String> {
        // ocrs currently only supports English/Latin alphabet
        vec!["eng".to_string()]
    }
}

fn model_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ocr-workbench")
}

fn ensure_model_downloaded(dir: &Path, url: &str, filename: &str) -> Result<PathBuf, OcrError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        OcrError::EngineUnavailable(format!("Failed to create cache directory: {}", e))
    })?;

    let model_path = dir.join(filename);

    if !model_path.exists() {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &model_path)?;
        tracing::info!("Downloaded {} to {:?}", filename, model_path);
    } else {
        tracing::info!("Using cached model from {:?}", model_path);
    }

    Ok(model_path)
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| OcrError::EngineUnavailable(format!("Failed to download model: {}", e)))?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        OcrError::EngineUnavailable(format!("Failed to read response body: {}", e))
    })?;

    // Write to a sibling file first so an interrupted download is never mistaken for a model
    let partial = path.with_extension("part");
    let mut file = File::create(&partial).map_err(|e| {
        OcrError::EngineUnavailable(format!("Failed to create model file: {}", e))
    })?;
    file.write_all(&buffer)
        .map_err(|e| OcrError::EngineUnavailable(format!("Failed to write model file: {}", e)))?;
    std::fs::rename(&partial, path)
        .map_err(|e| OcrError::EngineUnavailable(format!("Failed to store model file: {}", e)))?;

    Ok(())
}
