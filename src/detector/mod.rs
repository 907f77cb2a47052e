//! The external detector seam: a pre-trained model behind the [`Detector`]
//! trait, plus the process-lifetime [`DetectionSession`] handle.
//!
//! Backends return regions in letterbox (detector-input) pixel space; mapping
//! back to source coordinates is owned by the processing core, not the
//! backend.
use std::path::Path;

use image::RgbImage;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::Thresholds;

#[cfg(feature = "onnx")]
pub mod onnx;

/// A detected region with class and score.
///
/// Coordinates are in the space of the image handed to [`Detector::detect`]
/// (the letterbox canvas); the API layer maps them to source space before
/// exposing them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub class_id: usize,
    pub label: String,
    pub confidence: f32,
}

impl Detection {
    pub fn bbox(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Same detection with its box replaced (used for coordinate mapping).
    pub fn with_bbox(&self, bbox: [f32; 4]) -> Self {
        Self {
            x1: bbox[0],
            y1: bbox[1],
            x2: bbox[2],
            y2: bbox[3],
            ..self.clone()
        }
    }

    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn intersection(&self, other: &Detection) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);
        (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
    }

    pub fn union(&self, other: &Detection) -> f32 {
        self.area() + other.area() - self.intersection(other)
    }

    pub fn iou(&self, other: &Detection) -> f32 {
        let union = self.union(other);
        if union <= 0.0 {
            return 0.0;
        }
        self.intersection(other) / union
    }
}

/// Common interface for object detectors.
///
/// Implementations are opaque collaborators: they receive the normalized
/// canvas and the thresholds, and return scored regions. They never see the
/// original image.
pub trait Detector: Send + Sync {
    /// Detect regions in a single normalized image
    fn detect(&self, image: &RgbImage, thresholds: Thresholds) -> Result<Vec<Detection>>;

    /// Backend name (for logging and reports)
    fn name(&self) -> &str;

    /// Side of the square input canvas the model expects
    fn input_size(&self) -> u32;
}

/// Process-wide, read-only handle to the loaded detector.
///
/// Initialized once at startup and injected by reference into request
/// processing. A missing or unloadable model is not fatal: the session comes
/// up in degraded mode and detection calls report
/// [`Error::DetectorUnavailable`] while normalization keeps working.
pub struct DetectionSession {
    detector: Option<Box<dyn Detector>>,
}

impl DetectionSession {
    /// Load the model artifact once. Never fails; logs and degrades instead.
    pub fn initialize(model_path: Option<&Path>, input_size: u32) -> Self {
        let Some(path) = model_path else {
            warn!("No detector model configured; detection disabled");
            return Self::disabled();
        };

        if !path.exists() {
            warn!("Detector model {:?} not found; detection disabled", path);
            return Self::disabled();
        }

        match Self::load_backend(path, input_size) {
            Ok(detector) => {
                info!("Loaded detector `{}` from {:?}", detector.name(), path);
                Self {
                    detector: Some(detector),
                }
            }
            Err(e) => {
                warn!("Failed to load detector model {:?}: {}; detection disabled", path, e);
                Self::disabled()
            }
        }
    }

    #[cfg(feature = "onnx")]
    fn load_backend(path: &Path, input_size: u32) -> Result<Box<dyn Detector>> {
        Ok(Box::new(onnx::OnnxDetector::load(path, input_size)?))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_backend(_path: &Path, _input_size: u32) -> Result<Box<dyn Detector>> {
        Err(Error::DetectorUnavailable(
            "built without a detector backend (enable the `onnx` feature)".to_string(),
        ))
    }

    /// Wrap an already-constructed backend (custom integrations, tests).
    pub fn from_detector(detector: Box<dyn Detector>) -> Self {
        Self {
            detector: Some(detector),
        }
    }

    /// A session with detection disabled.
    pub fn disabled() -> Self {
        Self { detector: None }
    }

    pub fn detection_enabled(&self) -> bool {
        self.detector.is_some()
    }

    /// The loaded detector, or `DetectorUnavailable` in degraded mode.
    pub fn detector(&self) -> Result<&dyn Detector> {
        self.detector.as_deref().ok_or_else(|| {
            Error::DetectorUnavailable("no detector model loaded".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection {
            x1,
            y1,
            x2,
            y2,
            class_id: 0,
            label: "face".to_string(),
            confidence: 1.0,
        }
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = det(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = det(0.0, 0.0, 10.0, 10.0);
        let b = det(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        let a = det(0.0, 0.0, 10.0, 10.0);
        let b = det(5.0, 0.0, 15.0, 10.0);
        // intersection 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn degraded_session_reports_unavailable() {
        let session = DetectionSession::disabled();
        assert!(!session.detection_enabled());
        assert!(matches!(
            session.detector().err(),
            Some(Error::DetectorUnavailable(_))
        ));
    }

    #[test]
    fn missing_model_path_degrades() {
        let session =
            DetectionSession::initialize(Some(Path::new("/definitely/not/here.onnx")), 640);
        assert!(!session.detection_enabled());
    }
}
