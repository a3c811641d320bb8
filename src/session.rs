//! Session orchestration
//!
//! A session is one client's interaction context: the engine status checked
//! when it started, the preprocessing configuration, the uploaded image, its
//! preview and the last extracted text. Every action runs to completion
//! before the next one is accepted.

use crate::engine::Extraction;
use crate::error::OcrError;
use crate::loader;
use crate::ocr::OcrInvoker;
use crate::preprocessing::{Pipeline, PreprocessConfig, PreprocessingResult};
use image::{DynamicImage, GenericImageView};

/// Name of the downloadable text file
pub const DOWNLOAD_FILE_NAME: &str = "extract.txt";
/// MIME type of the downloadable text file
pub const DOWNLOAD_MIME_TYPE: &str = "text/plain; charset=utf-8";

/// Whether the OCR engine answered the availability check
#[derive(Debug, Clone, PartialEq)]
pub enum EngineStatus {
    Ready { version: String },
    Unavailable { error: OcrError },
}

/// Extracted text ready to be served as a file
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

pub struct Session {
    invoker: OcrInvoker,
    status: EngineStatus,
    config: PreprocessConfig,
    original: Option<DynamicImage>,
    preview: Option<PreprocessingResult>,
    text: Option<String>,
}

impl Session {
    /// Start a session, checking engine availability exactly once
    pub fn start(invoker: OcrInvoker, config: PreprocessConfig) -> Self {
        let status = match invoker.check_availability() {
            Ok(version) => EngineStatus::Ready { version },
            Err(error) => EngineStatus::Unavailable { error },
        };

        Self {
            invoker,
            status,
            config,
            original: None,
            preview: None,
            text: None,
        }
    }

    pub fn status(&self) -> &EngineStatus {
        &self.status
    }

    pub fn engine_version(&self) -> Option<&str> {
        match &self.status {
            EngineStatus::Ready { version } => Some(version),
            EngineStatus::Unavailable { .. } => None,
        }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Latest successful preprocessing output
    pub fn preview(&self) -> Option<&PreprocessingResult> {
        self.preview.as_ref()
    }

    /// Refuse all work once the availability check has failed
    fn ensure_ready(&self) -> Result<(), OcrError> {
        match &self.status {
            EngineStatus::Ready { .. } => Ok(()),
            EngineStatus::Unavailable { error } => Err(error.clone()),
        }
    }

    /// Decode an upload and preprocess it with the current configuration
    pub fn upload(&mut self, bytes: &[u8]) -> Result<&PreprocessingResult, OcrError> {
        self.ensure_ready()?;

        self.original = None;
        self.preview = None;
        self.text = None;

        let image = loader::decode(bytes)?;
        let (width, height) = image.dimensions();
        tracing::info!(width, height, bytes = bytes.len(), "Image uploaded");

        self.original = Some(image);
        self.reprocess()
    }

    /// Replace the configuration and re-run preprocessing on the stored upload
    pub fn configure(&mut self, config: PreprocessConfig) -> Result<&PreprocessingResult, OcrError> {
        self.ensure_ready()?;

        tracing::debug!(?config, "Preprocessing configuration changed");
        self.config = config;
        self.reprocess()
    }

    fn reprocess(&mut self) -> Result<&PreprocessingResult, OcrError> {
        self.preview = None;

        let original = self.original.clone().ok_or(OcrError::NoImage)?;
        let result = Pipeline::new(self.config.clone()).process(original)?;

        tracing::info!(
            total_time_ms = result.total_time_ms,
            steps = result.steps.len(),
            "Preprocessing finished"
        );

        Ok(&*self.preview.insert(result))
    }

    /// Run OCR once on the current preview
    pub fn extract(&mut self) -> Result<Extraction, OcrError> {
        self.ensure_ready()?;

        let preview = self.preview.as_ref().ok_or(OcrError::NoImage)?;
        let extraction = self.invoker.extract(&preview.image)?;

        self.text = match &extraction {
            Extraction::Text(text) => Some(text.clone()),
            Extraction::NoText => None,
        };

        Ok(extraction)
    }

    /// The last extracted text as a UTF-8 file
    pub fn download(&self) -> Result<Download, OcrError> {
        let text = self.text.as_ref().ok_or(OcrError::NoText)?;
        Ok(Download {
            file_name: DOWNLOAD_FILE_NAME,
            mime_type: DOWNLOAD_MIME_TYPE,
            bytes: text.as_bytes().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::testing::MockEngine;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::Arc;

    fn start(engine: MockEngine) -> (Session, Arc<MockEngine>) {
        let engine = Arc::new(engine);
        let session = Session::start(
            OcrInvoker::new(engine.clone()),
            PreprocessConfig::default(),
        );
        (session, engine)
    }

    fn encode(image: RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    fn color_jpeg() -> Vec<u8> {
        encode(
            RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 200])),
            ImageFormat::Jpeg,
        )
    }

    fn white_png() -> Vec<u8> {
        encode(
            RgbImage::from_pixel(64, 48, Rgb([255, 255, 255])),
            ImageFormat::Png,
        )
    }

    #[test]
    fn test_unavailable_engine_halts_session() {
        let (mut session, engine) = start(MockEngine::missing());

        assert!(matches!(session.status(), EngineStatus::Unavailable { .. }));
        assert!(matches!(
            session.upload(&white_png()),
            Err(OcrError::EngineUnavailable(_))
        ));
        assert!(matches!(
            session.configure(PreprocessConfig::passthrough()),
            Err(OcrError::EngineUnavailable(_))
        ));
        assert!(matches!(
            session.extract(),
            Err(OcrError::EngineUnavailable(_))
        ));
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn test_color_jpeg_threshold_only_aborts_before_ocr() {
        let (mut session, engine) = start(MockEngine::returning("text"));
        session
            .configure(PreprocessConfig {
                grayscale: false,
                denoise: false,
                threshold: true,
                ..PreprocessConfig::default()
            })
            .unwrap_err();

        let err = session.upload(&color_jpeg()).unwrap_err();
        assert!(matches!(err, OcrError::PreprocessingError(_)));
        assert!(session.preview().is_none());

        assert_eq!(session.extract().unwrap_err(), OcrError::NoImage);
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn test_reconfigure_recovers_after_preprocessing_error() {
        let (mut session, _) = start(MockEngine::returning("text"));
        session.configure(PreprocessConfig {
            grayscale: false,
            ..PreprocessConfig::default()
        })
        .unwrap_err();
        session.upload(&color_jpeg()).unwrap_err();

        let result = session.configure(PreprocessConfig::default()).unwrap();
        assert_eq!(result.image.dimensions(), (64, 48));
        assert!(session.extract().is_ok());
    }

    #[test]
    fn test_blank_image_yields_no_text() {
        let (mut session, engine) = start(MockEngine::returning("\u{c}"));
        session.upload(&white_png()).unwrap();

        assert_eq!(session.extract().unwrap(), Extraction::NoText);
        assert_eq!(session.download().unwrap_err(), OcrError::NoText);
        assert_eq!(engine.calls(), 1);
    }

    #[test]
    fn test_extracted_text_is_downloadable() {
        let (mut session, _) = start(MockEngine::returning("HELLO\n"));
        session.upload(&white_png()).unwrap();

        assert_eq!(
            session.extract().unwrap(),
            Extraction::Text("HELLO\n".to_string())
        );

        let download = session.download().unwrap();
        assert_eq!(download.file_name, "extract.txt");
        assert!(download.mime_type.starts_with("text/plain"));
        assert_eq!(download.bytes, b"HELLO\n");
    }

    #[test]
    fn test_decode_error_clears_previous_image() {
        let (mut session, engine) = start(MockEngine::returning("HELLO"));
        session.upload(&white_png()).unwrap();
        session.extract().unwrap();

        let err = session.upload(b"not an image").unwrap_err();
        assert!(matches!(err, OcrError::DecodeError(_)));
        assert!(session.preview().is_none());
        assert_eq!(session.download().unwrap_err(), OcrError::NoText);
        assert_eq!(session.extract().unwrap_err(), OcrError::NoImage);
        assert_eq!(engine.calls(), 1);
    }

    #[test]
    fn test_engine_error_is_scoped_to_request() {
        let (mut session, _) = start(MockEngine::failing(OcrError::EngineTimeout(
            "no result after 60.0s".to_string(),
        )));
        session.upload(&white_png()).unwrap();

        assert!(matches!(session.extract(), Err(OcrError::EngineTimeout(_))));
        // The session stays usable
        assert!(session.configure(PreprocessConfig::passthrough()).is_ok());
        assert_eq!(session.engine_version(), Some("5.3.4"));
    }

    #[test]
    fn test_configure_without_upload_is_no_image() {
        let (mut session, _) = start(MockEngine::returning(""));
        let err = session.configure(PreprocessConfig::passthrough()).unwrap_err();
        assert_eq!(err, OcrError::NoImage);
        assert_eq!(session.config(), &PreprocessConfig::passthrough());
    }

    #[test]
    fn test_preview_is_always_rgb() {
        let (mut session, _) = start(MockEngine::returning(""));
        let result = session.upload(&white_png()).unwrap();
        assert!(result.image.as_rgb8().is_some());
    }
}
