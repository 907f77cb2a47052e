use std::path::PathBuf;

use tracing::{info, warn};

use facedet::api::{detect_file, normalize_file, process_directory};
use facedet::core::params::DetectParams;
use facedet::detector::DetectionSession;
use facedet::types::{OutputFormat, Thresholds};

use super::args::CliArgs;
use super::errors::AppError;

fn build_params(args: &CliArgs) -> Result<DetectParams, AppError> {
    if args.size == 0 {
        return Err(AppError::ZeroSize { size: args.size });
    }
    for (name, value) in [("confidence", args.confidence), ("iou", args.iou)] {
        if !(0.0..=1.0).contains(&value) {
            return Err(AppError::ThresholdOutOfRange { name, value });
        }
    }

    Ok(DetectParams {
        format: args.format,
        target_size: args.size,
        equalize: args.equalize,
        thresholds: Thresholds {
            confidence: args.confidence,
            iou: args.iou,
        },
        save_crops: !args.no_crops,
    })
}

fn process_single_file(
    session: &DetectionSession,
    input: &PathBuf,
    output: &PathBuf,
    params: &DetectParams,
) -> Result<(), Box<dyn std::error::Error>> {
    if session.detection_enabled() {
        let outcome = detect_file(session, input, output, params)?;
        info!(
            "Detected {} region(s) in {:.2} ms",
            outcome.detections.len(),
            outcome.inference_ms
        );
        if outcome.detections.is_empty() {
            info!("No faces detected in this image");
        }
    } else {
        warn!("Detection disabled; writing normalized canvas only");
        normalize_file(input, output, params)?;
    }
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    let params = build_params(&args)?;

    // The model is loaded exactly once and the handle injected everywhere
    let session = DetectionSession::initialize(Some(args.model.as_path()), params.target_size);

    let batch_mode = args.batch || args.input_dir.is_some();

    if batch_mode {
        let input_dir = args.input_dir.ok_or(AppError::MissingArgument {
            arg: "--input-dir".to_string(),
        })?;
        let output_dir = args.output_dir.ok_or(AppError::MissingArgument {
            arg: "--output-dir".to_string(),
        })?;

        info!("Starting batch processing from directory: {:?}", input_dir);
        info!("Output directory: {:?}", output_dir);

        let report = process_directory(&session, &input_dir, &output_dir, &params, true)?;

        info!("Batch processing complete!");
        info!("Processed: {}", report.processed);
        info!("Skipped: {}", report.skipped);
        info!("Errors: {}", report.errors);
    } else {
        let input = args.input.ok_or(AppError::MissingArgument {
            arg: "--input".to_string(),
        })?;
        let output = match args.output {
            Some(output) => output,
            None => default_output_path(&input, args.format),
        };

        process_single_file(&session, &input, &output, &params)?;
        info!("Successfully processed: {:?} -> {:?}", input, output);
    }

    Ok(())
}

fn default_output_path(input: &PathBuf, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{}_detected.{}", stem, format.extension()))
}
