//! I/O layer: image ingest (size cap, format allowlist, decode) and
//! `writers` for PNG/JPEG outputs and the detection report sidecar.
pub mod reader;
pub use reader::{MAX_UPLOAD_BYTES, load_rgb_from_bytes, load_rgb_from_path};

pub mod writers;
