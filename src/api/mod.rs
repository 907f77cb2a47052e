//! High-level, ergonomic library API: normalize images to detector input,
//! run detection with result mapping, and save annotated outputs, crops, and
//! report sidecars. Prefer these entrypoints over the low-level processing
//! modules when embedding the pipeline.
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbImage;
use tracing::{info, warn};

use crate::core::params::DetectParams;
use crate::core::processing::annotate::draw_detections;
use crate::core::processing::crop::crop_detections;
use crate::core::processing::equalize::equalize_rgb;
use crate::core::processing::letterbox::{LetterboxTransform, letterbox_image};
use crate::detector::{Detection, DetectionSession};
use crate::error::{Error, Result};
use crate::io::reader::{load_rgb_from_bytes, load_rgb_from_path};
use crate::io::writers::jpeg::write_rgb_jpeg;
use crate::io::writers::png::{encode_rgb_png, write_rgb_png};
use crate::io::writers::report::{DetectionReport, create_report_sidecar};
use crate::types::OutputFormat;

/// Result of normalization only; produced even in degraded mode.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub original: RgbImage,
    /// Present when histogram equalization was requested
    pub equalized: Option<RgbImage>,
    /// The letterbox canvas handed to the detector
    pub canvas: RgbImage,
    pub transform: LetterboxTransform,
}

/// Full outcome of one detection request.
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub normalized: NormalizedImage,
    /// Detections mapped to source-image coordinates
    pub detections: Vec<Detection>,
    /// Original-resolution image with boxes drawn
    pub annotated: RgbImage,
    /// Source-resolution crops, one per detection (when requested)
    pub crops: Vec<RgbImage>,
    pub inference_ms: f64,
    pub detector: String,
}

impl DetectionOutcome {
    /// The annotated result encoded as a downloadable PNG byte stream.
    pub fn annotated_png(&self) -> Result<Vec<u8>> {
        encode_rgb_png(
            self.annotated.as_raw(),
            self.annotated.width(),
            self.annotated.height(),
        )
    }
}

/// Normalize an owned image: optional equalization, then letterboxing.
pub fn normalize_image(original: RgbImage, params: &DetectParams) -> Result<NormalizedImage> {
    let equalized = params.equalize.then(|| equalize_rgb(&original));
    let detector_input = equalized.as_ref().unwrap_or(&original);
    let (canvas, transform) = letterbox_image(detector_input, params.target_size)?;

    Ok(NormalizedImage {
        original,
        equalized,
        canvas,
        transform,
    })
}

/// Decode uploaded bytes (size cap, JPEG/PNG only) and normalize.
pub fn normalize_bytes(bytes: &[u8], params: &DetectParams) -> Result<NormalizedImage> {
    let original = load_rgb_from_bytes(bytes)?;
    normalize_image(original, params)
}

/// Run the full request-scoped pipeline on an owned image:
/// decode has already happened; equalize, letterbox, detect, map, annotate,
/// crop. Zero detections is a normal outcome, not an error.
pub fn detect_image(
    session: &DetectionSession,
    original: RgbImage,
    params: &DetectParams,
) -> Result<DetectionOutcome> {
    let detector = session.detector()?;
    let normalized = normalize_image(original, params)?;

    let started = Instant::now();
    let raw_detections = detector.detect(&normalized.canvas, params.thresholds)?;
    let inference_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(
        "Inference: {} region(s) in {:.2} ms",
        raw_detections.len(),
        inference_ms
    );

    // Map every box from letterbox space back to source coordinates before
    // anything downstream touches it
    let detections: Vec<Detection> = raw_detections
        .iter()
        .map(|d| d.with_bbox(normalized.transform.to_source(d.bbox())))
        .collect();

    if detections.is_empty() {
        info!("No regions detected");
    }

    let mut annotated = normalized.original.clone();
    draw_detections(&mut annotated, &detections);

    let crops = if params.save_crops {
        crop_detections(&normalized.original, &detections)
    } else {
        Vec::new()
    };

    Ok(DetectionOutcome {
        normalized,
        detections,
        annotated,
        crops,
        inference_ms,
        detector: detector.name().to_string(),
    })
}

/// Decode uploaded bytes and run the full pipeline.
pub fn detect_bytes(
    session: &DetectionSession,
    bytes: &[u8],
    params: &DetectParams,
) -> Result<DetectionOutcome> {
    let original = load_rgb_from_bytes(bytes)?;
    detect_image(session, original, params)
}

/// Process one file to an annotated output, crops, and a report sidecar.
pub fn detect_file(
    session: &DetectionSession,
    input: &Path,
    output: &Path,
    params: &DetectParams,
) -> Result<DetectionOutcome> {
    let original = load_rgb_from_path(input)?;
    let outcome = detect_image(session, original, params)?;

    save_rgb(output, &outcome.annotated, params.format)?;

    for (i, crop) in outcome.crops.iter().enumerate() {
        let crop_path = sibling_path(output, &format!("crop{:02}", i + 1), params.format);
        save_rgb(&crop_path, crop, params.format)?;
    }

    let report = DetectionReport::new(
        &outcome.detector,
        params.thresholds,
        &outcome.normalized.transform,
        params.equalize,
        outcome.inference_ms,
        outcome.detections.clone(),
    );
    create_report_sidecar(output, &report)?;

    Ok(outcome)
}

/// Normalize one file and save the letterbox canvas; the degraded-mode
/// (detection-disabled) file path.
pub fn normalize_file(input: &Path, output: &Path, params: &DetectParams) -> Result<()> {
    let original = load_rgb_from_path(input)?;
    let normalized = normalize_image(original, params)?;
    save_rgb(output, &normalized.canvas, params.format)
}

/// Batch processing report
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Return the candidate image files directly under `input_dir`.
pub fn iterate_image_files(input_dir: &Path) -> Result<std::vec::IntoIter<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input_dir).map_err(Error::from)? {
        let entry = entry.map_err(Error::from)?;
        let path = entry.path();
        if path.is_file() && has_image_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files.into_iter())
}

/// Process every image under `input_dir` into `output_dir`.
///
/// In degraded mode each file gets a normalized canvas instead of an
/// annotated result. If `continue_on_error` is true, per-file errors are
/// counted and processing continues; otherwise the first error is returned.
pub fn process_directory(
    session: &DetectionSession,
    input_dir: &Path,
    output_dir: &Path,
    params: &DetectParams,
    continue_on_error: bool,
) -> Result<BatchReport> {
    std::fs::create_dir_all(output_dir).map_err(Error::from)?;

    if !session.detection_enabled() {
        warn!("Detection disabled; batch will emit normalized canvases only");
    }

    let mut report = BatchReport::default();

    for path in iterate_image_files(input_dir)? {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let result = if session.detection_enabled() {
            let output_path = output_dir.join(format!(
                "{}_detected.{}",
                stem,
                params.format.extension()
            ));
            detect_file(session, &path, &output_path, params).map(|_| ())
        } else {
            let output_path = output_dir.join(format!(
                "{}_normalized.{}",
                stem,
                params.format.extension()
            ));
            normalize_file(&path, &output_path, params)
        };

        match result {
            Ok(()) => report.processed += 1,
            Err(e) => {
                warn!("Error processing {:?}: {}", path, e);
                report.errors += 1;
                if !continue_on_error {
                    return Err(e);
                }
            }
        }
    }

    Ok(report)
}

fn has_image_extension(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("jpg") | Some("jpeg") | Some("png")
    )
}

fn sibling_path(output: &Path, suffix: &str, format: OutputFormat) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{}_{}.{}", stem, suffix, format.extension()))
}

fn save_rgb(output: &Path, image: &RgbImage, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Png => write_rgb_png(output, image.width(), image.height(), image.as_raw()),
        OutputFormat::Jpeg => write_rgb_jpeg(output, image.width(), image.height(), image.as_raw()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Detector;

    struct StubDetector {
        boxes: Vec<Detection>,
    }

    impl Detector for StubDetector {
        fn detect(
            &self,
            _image: &RgbImage,
            _thresholds: crate::types::Thresholds,
        ) -> Result<Vec<Detection>> {
            Ok(self.boxes.clone())
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn input_size(&self) -> u32 {
            640
        }
    }

    fn stub_session(boxes: Vec<Detection>) -> DetectionSession {
        DetectionSession::from_detector(Box::new(StubDetector { boxes }))
    }

    fn letterbox_box(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection {
            x1,
            y1,
            x2,
            y2,
            class_id: 0,
            label: "face".to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn detections_are_mapped_to_source_space() {
        // 1920x1080 source -> 640x640 canvas: scale 1/3, pad_top 140
        let original = RgbImage::from_pixel(1920, 1080, image::Rgb([50, 50, 50]));
        let session = stub_session(vec![letterbox_box(0.0, 140.0, 320.0, 500.0)]);

        let outcome = detect_image(&session, original, &DetectParams::default()).unwrap();
        assert_eq!(outcome.detections.len(), 1);
        let d = &outcome.detections[0];
        assert!((d.x1 - 0.0).abs() < 2.0);
        assert!((d.y1 - 0.0).abs() < 2.0);
        assert!((d.x2 - 960.0).abs() < 2.0);
        assert!((d.y2 - 1080.0).abs() < 2.0);

        // Crop is taken from the source-resolution image
        assert_eq!(outcome.crops.len(), 1);
        assert!((outcome.crops[0].width() as i64 - 960).abs() <= 2);
        assert!((outcome.crops[0].height() as i64 - 1080).abs() <= 2);
    }

    #[test]
    fn zero_detections_is_a_normal_outcome() {
        let original = RgbImage::from_pixel(320, 240, image::Rgb([10, 10, 10]));
        let session = stub_session(vec![]);
        let outcome = detect_image(&session, original.clone(), &DetectParams::default()).unwrap();
        assert!(outcome.detections.is_empty());
        assert!(outcome.crops.is_empty());
        assert_eq!(outcome.annotated, original);
    }

    #[test]
    fn degraded_session_fails_detection_but_not_normalization() {
        let original = RgbImage::from_pixel(320, 240, image::Rgb([10, 10, 10]));
        let session = DetectionSession::disabled();

        assert!(matches!(
            detect_image(&session, original.clone(), &DetectParams::default()),
            Err(Error::DetectorUnavailable(_))
        ));

        let normalized = normalize_image(original, &DetectParams::default()).unwrap();
        assert_eq!(
            (normalized.canvas.width(), normalized.canvas.height()),
            (640, 640)
        );
    }

    #[test]
    fn equalize_flag_populates_intermediate() {
        let original = RgbImage::from_pixel(64, 64, image::Rgb([100, 100, 100]));
        let params = DetectParams {
            equalize: true,
            ..DetectParams::default()
        };
        let normalized = normalize_image(original, &params).unwrap();
        assert!(normalized.equalized.is_some());
    }

    #[test]
    fn outcome_png_round_trips() {
        let original = RgbImage::from_fn(40, 30, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let session = stub_session(vec![]);
        let outcome = detect_image(&session, original.clone(), &DetectParams::default()).unwrap();
        let png = outcome.annotated_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded, original);
    }
}
