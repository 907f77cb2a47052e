#![doc = r#"
facedet — letterbox normalization and result mapping for fixed-input detectors.

This crate provides a typed, ergonomic API for preparing arbitrary JPEG/PNG
images for a square-input, pre-trained object detector and for mapping the
detector's output back into the source image: uniform-scale letterbox resize
with mid-gray padding, optional histogram equalization, inverse coordinate
mapping, annotation, per-detection crops, and lossless PNG encoding for
download. It powers the facedet CLI and can be embedded in your own Rust
applications.

The detector itself is an external collaborator behind the
[`detector::Detector`] trait; a YOLO-style ONNX Runtime backend ships behind
the `onnx` feature. Without a backend (or without a model file) the pipeline
runs in degraded mode: normalization and encoding keep working, detection
calls report `DetectorUnavailable`.

Quick start: process one image file
-----------------------------------
```rust,no_run
use std::path::Path;
use facedet::{DetectParams, DetectionSession, api};

fn main() -> facedet::Result<()> {
    // Load the model once at startup; missing model => degraded mode
    let session = DetectionSession::initialize(Some(Path::new("model/detector.onnx")), 640);

    let params = DetectParams::default();
    let outcome = api::detect_file(
        &session,
        Path::new("group_photo.jpg"),
        Path::new("group_photo_detected.png"),
        &params,
    )?;

    println!(
        "{} region(s) in {:.1} ms",
        outcome.detections.len(),
        outcome.inference_ms
    );
    Ok(())
}
```

Process uploaded bytes in-memory
--------------------------------
```rust,no_run
use facedet::{DetectParams, DetectionSession, api};

fn handle_upload(session: &DetectionSession, payload: &[u8]) -> facedet::Result<Vec<u8>> {
    let params = DetectParams {
        equalize: true,
        ..DetectParams::default()
    };
    // Size cap and JPEG/PNG allowlist are enforced before decoding
    let outcome = api::detect_bytes(session, payload, &params)?;
    // Lossless PNG byte stream, ready for a download response
    outcome.annotated_png()
}
```

Normalization without a detector
--------------------------------
```rust
use facedet::{DetectParams, api};
use image::RgbImage;

fn main() -> facedet::Result<()> {
    let img = RgbImage::new(1920, 1080);
    let normalized = api::normalize_image(img, &DetectParams::default())?;

    assert_eq!(normalized.canvas.width(), 640);
    assert_eq!(normalized.canvas.height(), 640);
    // The transform maps detector-space boxes back into the source image
    let src_box = normalized.transform.to_source([0.0, 140.0, 640.0, 500.0]);
    assert!(src_box[3] <= 1080.0);
    Ok(())
}
```

Error handling
--------------
All public functions return `facedet::Result<T>`; match on `facedet::Error`
to handle specific cases, e.g. oversized uploads or degraded mode.

```rust,no_run
use facedet::{DetectParams, DetectionSession, Error, api};

fn main() {
    let session = DetectionSession::disabled();
    match api::detect_bytes(&session, &[0u8; 4], &DetectParams::default()) {
        Ok(_) => {}
        Err(Error::DetectorUnavailable(msg)) => eprintln!("detection disabled: {msg}"),
        Err(Error::OversizedUpload { size, max }) => eprintln!("too big: {size} > {max}"),
        Err(other) => eprintln!("Other error: {other}"),
    }
}
```

Feature flags
-------------
- `onnx`: builds the ONNX Runtime detector backend (`detector::onnx`).

Useful modules
--------------
- [`api`] — high-level, ergonomic entry points.
- [`core`] — letterbox, equalization, annotation, and crop primitives.
- [`detector`] — the `Detector` trait, `DetectionSession`, and backends.
- [`io`] — image ingest and PNG/JPEG/report writers.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod detector;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::params::DetectParams;
pub use crate::core::processing::letterbox::{LetterboxTransform, PAD_VALUE};
pub use error::{Error, Result};
pub use types::{OutputFormat, Thresholds};

// Detector seam
pub use detector::{Detection, DetectionSession, Detector};

// Selected writer helpers (keep low-level encoders public)
pub use io::writers::png::{encode_rgb_png, write_rgb_png};
pub use io::writers::report::{DetectionReport, create_report_sidecar};

// High-level API re-exports
pub use api::{
    BatchReport, DetectionOutcome, NormalizedImage, detect_bytes, detect_file, detect_image,
    iterate_image_files, normalize_bytes, normalize_file, normalize_image, process_directory,
};
