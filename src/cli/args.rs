use clap::Parser;
use std::path::PathBuf;

use facedet::types::OutputFormat;

#[derive(Parser)]
#[command(name = "facedet", version, about = "facedet CLI")]
pub struct CliArgs {
    /// Input image file (single file mode)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Input directory containing images (batch mode)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Output filename (single file mode)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing (batch mode)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Output format (png or jpeg)
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Png)]
    pub format: OutputFormat,

    /// Path to the serialized detector model artifact
    #[arg(short, long, default_value = "model/detector.onnx")]
    pub model: PathBuf,

    /// Detector input canvas size in pixels (square)
    #[arg(long, default_value_t = 640)]
    pub size: u32,

    /// Histogram-equalize luma before detection (helps under-exposed images)
    #[arg(long, default_value_t = false)]
    pub equalize: bool,

    /// Minimum confidence score for a reported region
    #[arg(long, default_value_t = 0.15)]
    pub confidence: f32,

    /// IoU overlap threshold for duplicate suppression
    #[arg(long, default_value_t = 0.3)]
    pub iou: f32,

    /// Skip writing per-detection crops
    #[arg(long, default_value_t = false)]
    pub no_crops: bool,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Batch mode: continue processing other files on per-file errors
    #[arg(long, default_value_t = false)]
    pub batch: bool,
}
