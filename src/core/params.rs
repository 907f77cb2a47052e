use serde::{Deserialize, Serialize};

use crate::types::{OutputFormat, Thresholds};

/// Processing parameters suitable for config files and presets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectParams {
    pub format: OutputFormat,
    /// Side of the square detector input canvas in pixels
    pub target_size: u32,
    /// If true, histogram-equalize luma before letterboxing
    pub equalize: bool,
    pub thresholds: Thresholds,
    /// If true, emit one crop per detection (source resolution)
    pub save_crops: bool,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            target_size: 640,
            equalize: false,
            thresholds: Thresholds::default(),
            save_crops: true,
        }
    }
}
