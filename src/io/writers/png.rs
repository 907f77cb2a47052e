use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::{Error, Result};

/// Encode an interleaved RGB grid as lossless PNG bytes, suitable for a
/// client download. Round-trips pixel-exactly through any conformant decoder.
pub fn encode_rgb_png(data: &[u8], cols: u32, rows: u32) -> Result<Vec<u8>> {
    validate_rgb_shape(data, cols, rows)?;

    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(data, cols, rows, ExtendedColorType::Rgb8)
        .map_err(|e| Error::Encoding(e.to_string()))?;
    Ok(buf)
}

pub fn write_rgb_png(output: &Path, cols: u32, rows: u32, data: &[u8]) -> Result<()> {
    validate_rgb_shape(data, cols, rows)?;

    let file = File::create(output)?;
    let writer = BufWriter::new(file);
    PngEncoder::new(writer)
        .write_image(data, cols, rows, ExtendedColorType::Rgb8)
        .map_err(|e| Error::Encoding(e.to_string()))?;
    Ok(())
}

fn validate_rgb_shape(data: &[u8], cols: u32, rows: u32) -> Result<()> {
    if cols == 0 || rows == 0 {
        return Err(Error::Encoding(format!(
            "cannot encode empty image ({}x{})",
            cols, rows
        )));
    }
    let expected = cols as usize * rows as usize * 3;
    if data.len() != expected {
        return Err(Error::Encoding(format!(
            "buffer is not 3-channel RGB: expected {} bytes for {}x{}, got {}",
            expected,
            cols,
            rows,
            data.len()
        )));
    }
    Ok(())
}
