use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::core::processing::letterbox::LetterboxTransform;
use crate::detector::Detection;
use crate::error::Result;
use crate::types::Thresholds;

/// Detection report written as a JSON sidecar next to the annotated output.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub detector: String,
    pub created_utc: String,
    pub thresholds: Thresholds,
    pub source_width: u32,
    pub source_height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub equalized: bool,
    pub inference_ms: f64,
    /// Source-space boxes
    pub detections: Vec<Detection>,
}

impl DetectionReport {
    pub fn new(
        detector: &str,
        thresholds: Thresholds,
        transform: &LetterboxTransform,
        equalized: bool,
        inference_ms: f64,
        detections: Vec<Detection>,
    ) -> Self {
        Self {
            detector: detector.to_string(),
            created_utc: chrono::Utc::now().to_rfc3339(),
            thresholds,
            source_width: transform.source_w,
            source_height: transform.source_h,
            canvas_width: transform.target_w,
            canvas_height: transform.target_h,
            equalized,
            inference_ms,
            detections,
        }
    }
}

/// Write the report as `<output>.json`.
pub fn create_report_sidecar(output_path: &Path, report: &DetectionReport) -> Result<()> {
    let sidecar_path = output_path.with_extension("json");
    let json_string = serde_json::to_string_pretty(report)
        .map_err(|e| crate::error::Error::Encoding(e.to_string()))?;
    std::fs::write(&sidecar_path, json_string)?;

    info!("Created detection report sidecar: {:?}", sidecar_path);
    Ok(())
}
