//! Shared types and enums used across the crate.
//! Includes `OutputFormat` for saved results and `Thresholds` for detector
//! score/overlap cutoffs.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Lossless, also used for the download byte stream
    Png,
    /// Lossy, preview only
    Jpeg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Png => write!(f, "PNG"),
            OutputFormat::Jpeg => write!(f, "JPEG"),
        }
    }
}

/// Detector score/overlap cutoffs, passed through to the backend untouched.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum confidence score for a region to be reported
    pub confidence: f32,
    /// Maximum allowed overlap before a candidate is suppressed as duplicate
    pub iou: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            confidence: 0.15,
            iou: 0.3,
        }
    }
}
