use jpeg_encoder::{ColorType, Encoder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::{Error, Result};

const JPEG_QUALITY: u8 = 90;

pub fn write_rgb_jpeg(output: &Path, cols: u32, rows: u32, data: &[u8]) -> Result<()> {
    let expected = cols as usize * rows as usize * 3;
    if cols == 0 || rows == 0 || data.len() != expected {
        return Err(Error::Encoding(format!(
            "buffer is not 3-channel RGB: expected {} bytes for {}x{}, got {}",
            expected,
            cols,
            rows,
            data.len()
        )));
    }

    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let encoder = Encoder::new(&mut writer, JPEG_QUALITY);
    encoder
        .encode(data, cols as u16, rows as u16, ColorType::Rgb)
        .map_err(|e| Error::Encoding(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_jpeg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let data = vec![128u8; 16 * 16 * 3];
        write_rgb_jpeg(&path, 16, 16, &data).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn rejects_wrong_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        assert!(matches!(
            write_rgb_jpeg(&path, 4, 4, &[0u8; 5]),
            Err(Error::Encoding(_))
        ));
    }
}
