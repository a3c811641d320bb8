//! Tesseract CLI engine implementation
//!
//! Drives the system `tesseract` executable. The image is written to a
//! temporary PNG and the recognized text is read from stdout.

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::OcrError;
use image::{DynamicImage, ImageFormat};
use std::ffi::{OsStr, OsString};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::runtime::{Builder, Handle};

/// Tesseract OCR Engine
pub struct TesseractEngine {
    /// Executable name or path
    command: PathBuf,
    language: String,
    tessdata_path: Option<PathBuf>,
    /// Time budget for one extraction
    timeout: Option<Duration>,
}

impl TesseractEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            language: config.language.clone(),
            tessdata_path: config.tessdata_path.clone(),
            timeout: config.timeout,
        }
    }

    /// Run tesseract to completion from a blocking context
    fn execute(&self, args: &[&OsStr]) -> Result<Output, OcrError> {
        block_on(self.run(args))?
    }

    /// Run tesseract with the given arguments. The child is killed when the
    /// time budget elapses.
    async fn run(&self, args: &[&OsStr]) -> Result<Output, OcrError> {
        let child = Command::new(&self.command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let output = child.wait_with_output();
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output).await.map_err(|_| {
                tracing::warn!("tesseract timed out after {:.1}s", limit.as_secs_f32());
                OcrError::EngineTimeout(format!("no result after {:.1}s", limit.as_secs_f32()))
            })?,
            None => output.await,
        };

        result.map_err(|e| OcrError::Unexpected(format!("Failed to wait for tesseract: {}", e)))
    }

    fn spawn_error(&self, error: io::Error) -> OcrError {
        if error.kind() == io::ErrorKind::NotFound {
            OcrError::EngineUnavailable(format!(
                "{} is not installed or it's not in your PATH",
                self.command.display()
            ))
        } else {
            OcrError::Unexpected(format!(
                "Failed to start {}: {}",
                self.command.display(),
                error
            ))
        }
    }

    fn extraction_args(&self, input: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            input.as_os_str().to_owned(),
            "stdout".into(),
            "-l".into(),
            self.language.clone().into(),
        ];
        if let Some(tessdata) = &self.tessdata_path {
            args.push("--tessdata-dir".into());
            args.push(tessdata.as_os_str().to_owned());
        }
        args
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR via the system tesseract executable"
    }

    fn version(&self) -> Result<String, OcrError> {
        let output = self.execute(&[OsStr::new("--version")])?;

        // Older releases print the version banner on stderr
        let banner = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        parse_version(&banner).ok_or_else(|| {
            OcrError::Unexpected(format!(
                "Could not read a version from `{} --version` ({}): {}",
                self.command.display(),
                output.status,
                banner.trim()
            ))
        })
    }

    fn image_to_string(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let input = tempfile::Builder::new()
            .prefix("ocr-workbench-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Unexpected(format!("Failed to create temp file: {}", e)))?;

        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| OcrError::Unexpected(format!("Failed to write temp image: {}", e)))?;

        let args = self.extraction_args(input.path());
        let args: Vec<&OsStr> = args.iter().map(|a| a.as_os_str()).collect();

        tracing::debug!(
            command = %self.command.display(),
            language = %self.language,
            width = image.width(),
            height = image.height(),
            "Running tesseract"
        );

        let output = self.execute(&args)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("tesseract exited with {}", output.status)
            } else {
                stderr
            };
            return Err(OcrError::EngineProcessing(message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn supported_languages(&self) -> Vec<String> {
        let mut args: Vec<&OsStr> = vec![OsStr::new("--list-langs")];
        if let Some(tessdata) = &self.tessdata_path {
            args.push(OsStr::new("--tessdata-dir"));
            args.push(tessdata.as_os_str());
        }

        match self.execute(&args) {
            Ok(output) if output.status.success() => {
                let languages = parse_language_list(&String::from_utf8_lossy(&output.stdout));
                if languages.is_empty() {
                    vec![self.language.clone()]
                } else {
                    languages
                }
            }
            _ => vec![self.language.clone()],
        }
    }
}

/// Drive a future to completion on the ambient runtime from one of its
/// blocking threads, or on a private runtime when there is none
fn block_on<F: Future>(future: F) -> Result<F::Output, OcrError> {
    match Handle::try_current() {
        Ok(handle) => Ok(handle.block_on(future)),
        Err(_) => Builder::new_current_thread()
            .enable_all()
            .build()
            .map(|runtime| runtime.block_on(future))
            .map_err(|e| OcrError::Unexpected(format!("Failed to start runtime: {}", e))),
    }
}

/// Pull the version out of a `tesseract --version` banner, e.g. "tesseract 5.3.4"
fn parse_version(banner: &str) -> Option<String> {
    banner
        .lines()
        .map(str::trim)
        .find_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(name), Some(version)) if name.eq_ignore_ascii_case("tesseract") => {
                    Some(version.trim_start_matches('v').to_string())
                }
                _ => None,
            }
        })
        .filter(|version| !version.is_empty())
}

/// Parse `tesseract --list-langs` output, skipping the header line
fn parse_language_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
        .map(str::to_string)
        .collect()
}
