use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CutoutError {
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Could not detect enough screen pixels: found {found}, need at least {required}")]
    InsufficientDetection { found: usize, required: usize },

    #[error("Invalid punch rectangle computed: ({x0}, {y0}, {x1}, {y1})")]
    DegenerateGeometry { x0: i64, y0: i64, x1: i64, y1: i64 },

    #[error("Dimension mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, CutoutError>;
