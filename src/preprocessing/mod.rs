//! Image preprocessing module for OCR enhancement
//!
//! Applies the user's preprocessing configuration as a fixed-order pipeline.

pub mod config;
pub mod pipeline;
pub mod steps;

pub use config::PreprocessConfig;
pub use pipeline::{Pipeline, PreprocessingResult, StepTiming};
