//! Individual preprocessing steps, in pipeline order

pub mod grayscale;
pub mod denoise;
pub mod threshold;
pub mod rotate;
pub mod rotate_free;
pub mod color;
