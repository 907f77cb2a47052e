//! ONNX Runtime backend for YOLO-style single-output detectors.
//!
//! Loads the model once, feeds the normalized letterbox canvas as a CHW f32
//! tensor, and decodes the `[1, 4+nc, anchors]` output (either orientation)
//! with confidence filtering and greedy NMS.
use std::path::Path;
use std::sync::Mutex;

use image::RgbImage;
use ort::session::Session;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Thresholds;

use super::{Detection, Detector};

/// Upper bound on candidates entering NMS to bound CPU time.
const MAX_NMS_INPUTS: usize = 300;

impl From<ort::Error> for Error {
    fn from(e: ort::Error) -> Self {
        Error::Detector(e.to_string())
    }
}

pub struct OnnxDetector {
    session: Mutex<Session>,
    input_size: u32,
    class_names: Vec<String>,
}

impl OnnxDetector {
    /// Load a serialized model artifact. `input_size` is the side of the
    /// square canvas the model was exported for.
    pub fn load(path: &Path, input_size: u32) -> Result<Self> {
        if input_size == 0 {
            return Err(Error::ZeroSize { size: input_size });
        }

        let session = Session::builder()?.commit_from_file(path)?;
        let class_names = read_class_names(&session);
        debug!(
            "ONNX detector loaded: input {0}x{0}, {1} named classes",
            input_size,
            class_names.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_size,
            class_names,
        })
    }

    fn label_for(&self, class_id: usize) -> String {
        self.class_names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }
}

impl Detector for OnnxDetector {
    fn detect(&self, image: &RgbImage, thresholds: Thresholds) -> Result<Vec<Detection>> {
        let size = self.input_size;
        if image.width() != size || image.height() != size {
            return Err(Error::InvalidInput(format!(
                "detector expects a {0}x{0} canvas, got {1}x{2}",
                size,
                image.width(),
                image.height()
            )));
        }

        // HWC u8 -> normalized CHW f32
        let s = size as usize;
        let raw = image.as_raw();
        let mut chw = vec![0.0f32; 3 * s * s];
        for y in 0..s {
            for x in 0..s {
                let src = (y * s + x) * 3;
                let dst = y * s + x;
                chw[dst] = raw[src] as f32 / 255.0;
                chw[s * s + dst] = raw[src + 1] as f32 / 255.0;
                chw[2 * s * s + dst] = raw[src + 2] as f32 / 255.0;
            }
        }

        let input = ort::value::Value::from_array(([1usize, 3, s, s], chw))?;

        let session = self
            .session
            .lock()
            .map_err(|_| Error::Processing("detector session lock poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![input])?;

        let output = outputs
            .get("output0")
            .or_else(|| outputs.get("output"))
            .ok_or_else(|| Error::Detector("model has no `output0`/`output` node".to_string()))?;
        let (shape, data) = output.try_extract_tensor::<f32>()?;

        let candidates = decode_predictions(&shape[..], data, size as f32, thresholds.confidence)?;
        let kept = non_max_suppression(candidates, thresholds.iou);

        Ok(kept
            .into_iter()
            .map(|c| Detection {
                x1: c.bbox[0],
                y1: c.bbox[1],
                x2: c.bbox[2],
                y2: c.bbox[3],
                class_id: c.class_id,
                label: self.label_for(c.class_id),
                confidence: c.confidence,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "yolo-onnx"
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }
}

struct Candidate {
    bbox: [f32; 4],
    class_id: usize,
    confidence: f32,
}

/// Decode a `[1, 4+nc, anchors]` or `[1, anchors, 4+nc]` prediction tensor
/// into thresholded xyxy candidates.
fn decode_predictions(
    shape: &[i64],
    data: &[f32],
    canvas_size: f32,
    confidence: f32,
) -> Result<Vec<Candidate>> {
    if shape.len() != 3 || shape[0] != 1 {
        return Err(Error::Detector(format!(
            "unexpected output shape {:?}, want [1, features, anchors]",
            shape
        )));
    }

    let (d1, d2) = (shape[1] as usize, shape[2] as usize);
    if d1.min(d2) < 5 {
        return Err(Error::Detector(format!(
            "output shape {:?} has no class channels",
            shape
        )));
    }
    // The feature axis (4 box values + class scores) is the smaller one
    let features_first = d1 < d2;
    let (features, anchors) = if features_first { (d1, d2) } else { (d2, d1) };
    if data.len() != features * anchors {
        return Err(Error::Detector(format!(
            "output length {} does not match shape {:?}",
            data.len(),
            shape
        )));
    }
    let at = |anchor: usize, feature: usize| -> f32 {
        if features_first {
            data[feature * anchors + anchor]
        } else {
            data[anchor * features + feature]
        }
    };

    let num_classes = features - 4;
    let mut candidates = Vec::new();
    for a in 0..anchors {
        let mut best_class = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for c in 0..num_classes {
            let score = at(a, 4 + c);
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }
        if best_score < confidence {
            continue;
        }

        let (cx, cy, w, h) = (at(a, 0), at(a, 1), at(a, 2), at(a, 3));
        let bbox = [
            (cx - w / 2.0).clamp(0.0, canvas_size),
            (cy - h / 2.0).clamp(0.0, canvas_size),
            (cx + w / 2.0).clamp(0.0, canvas_size),
            (cy + h / 2.0).clamp(0.0, canvas_size),
        ];
        candidates.push(Candidate {
            bbox,
            class_id: best_class,
            confidence: best_score,
        });
    }

    // Keep the strongest candidates when the model floods us
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates.truncate(MAX_NMS_INPUTS);
    Ok(candidates)
}

/// Greedy per-class NMS over confidence-sorted candidates.
fn non_max_suppression(sorted: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = Vec::new();
    'outer: for cand in sorted {
        for k in &kept {
            if k.class_id == cand.class_id && iou(&k.bbox, &cand.bbox) > iou_threshold {
                continue 'outer;
            }
        }
        kept.push(cand);
    }
    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = ix * iy;
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

/// Pull class labels out of the exporter metadata when present.
///
/// Ultralytics exports carry a `names` entry shaped like
/// `{0: 'face', 1: 'profile'}`; anything unparsable just falls back to
/// numbered labels.
fn read_class_names(session: &Session) -> Vec<String> {
    let Ok(metadata) = session.metadata() else {
        return Vec::new();
    };
    let Ok(Some(names)) = metadata.custom("names") else {
        return Vec::new();
    };

    let mut parsed: Vec<(usize, String)> = Vec::new();
    for entry in names.trim_matches(['{', '}']).split(',') {
        let Some((key, value)) = entry.split_once(':') else {
            continue;
        };
        let Ok(id) = key.trim().parse::<usize>() else {
            continue;
        };
        let label = value.trim().trim_matches(['\'', '"']).to_string();
        parsed.push((id, label));
    }
    parsed.sort_by_key(|(id, _)| *id);
    parsed.into_iter().map(|(_, label)| label).collect()
}
