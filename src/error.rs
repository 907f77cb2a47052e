//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O and image-decoding errors, and provides semantic
//! variants for input validation, encoding, and detector availability.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("upload too large: {size} bytes (max {max})")]
    OversizedUpload { size: usize, max: usize },

    #[error("target size must be greater than 0, got: {size}")]
    ZeroSize { size: u32 },

    #[error("detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("detector error: {0}")]
    Detector(String),

    #[error("processing error: {0}")]
    Processing(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::Processing(e.to_string())
    }
}
