use std::path::Path;

use image::{ImageFormat, RgbImage};
use tracing::debug;

use crate::error::{Error, Result};

/// Upload size cap: anything larger is rejected before decoding.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Accepted input formats
const ALLOWED_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png];

/// Decode uploaded image bytes into an owned RGB8 buffer.
///
/// Enforces the size cap and the JPEG/PNG allowlist before decoding; a
/// malformed payload fails fast with a decode error and no partial output.
pub fn load_rgb_from_bytes(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(Error::OversizedUpload {
            size: bytes.len(),
            max: MAX_UPLOAD_BYTES,
        });
    }

    let format = image::guess_format(bytes)?;
    if !ALLOWED_FORMATS.contains(&format) {
        return Err(Error::InvalidInput(format!(
            "unsupported image format {:?}, expected JPEG or PNG",
            format
        )));
    }

    let img = image::load_from_memory_with_format(bytes, format)?;
    debug!(
        "Decoded {:?} input: {}x{}",
        format,
        img.width(),
        img.height()
    );
    Ok(img.to_rgb8())
}

/// Read and decode an image file, with the same cap and allowlist.
pub fn load_rgb_from_path(path: &Path) -> Result<RgbImage> {
    let bytes = std::fs::read(path)?;
    load_rgb_from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(w, h, Rgb([1, 2, 3]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn decodes_png_to_rgb() {
        let img = load_rgb_from_bytes(&png_bytes(10, 12)).unwrap();
        assert_eq!((img.width(), img.height()), (10, 12));
        assert_eq!(img.get_pixel(0, 0), &Rgb([1, 2, 3]));
    }

    #[test]
    fn rejects_oversized_payload() {
        let bytes = vec![0u8; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            load_rgb_from_bytes(&bytes),
            Err(Error::OversizedUpload { .. })
        ));
    }

    #[test]
    fn rejects_malformed_payload() {
        // A PNG header followed by garbage
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(load_rgb_from_bytes(&bytes).is_err());
    }

    #[test]
    fn rejects_unsupported_format() {
        // BMP magic
        let bytes = vec![b'B', b'M', 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(load_rgb_from_bytes(&bytes).is_err());
    }
}
