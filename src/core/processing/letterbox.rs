use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Neutral mid-gray fill used for the padded border, per detector convention.
pub const PAD_VALUE: u8 = 114;

const RGB_CHANNELS: usize = 3;

/// Geometry of a letterbox operation: uniform scale plus centering pads.
///
/// Computed fresh per image and carried alongside the canvas so detection
/// results can be mapped back to source coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxTransform {
    /// Uniform scale factor, `min(target_w/src_w, target_h/src_h)`
    pub scale: f64,
    pub pad_left: u32,
    pub pad_top: u32,
    /// Dimensions of the visible (non-padded) region
    pub scaled_w: u32,
    pub scaled_h: u32,
    pub source_w: u32,
    pub source_h: u32,
    pub target_w: u32,
    pub target_h: u32,
}

impl LetterboxTransform {
    pub fn compute(source_w: u32, source_h: u32, target_w: u32, target_h: u32) -> Result<Self> {
        if target_w == 0 {
            return Err(Error::ZeroSize { size: target_w });
        }
        if target_h == 0 {
            return Err(Error::ZeroSize { size: target_h });
        }
        if source_w == 0 || source_h == 0 {
            return Err(Error::InvalidInput(format!(
                "source image must be at least 1x1, got {}x{}",
                source_w, source_h
            )));
        }

        let scale = (target_w as f64 / source_w as f64).min(target_h as f64 / source_h as f64);
        let scaled_w = ((source_w as f64 * scale).round() as u32).clamp(1, target_w);
        let scaled_h = ((source_h as f64 * scale).round() as u32).clamp(1, target_h);

        // Even split per side, remainder absorbed by right/bottom
        let pad_left = (target_w - scaled_w) / 2;
        let pad_top = (target_h - scaled_h) / 2;

        Ok(Self {
            scale,
            pad_left,
            pad_top,
            scaled_w,
            scaled_h,
            source_w,
            source_h,
            target_w,
            target_h,
        })
    }

    /// True when the source already matches the target canvas exactly.
    pub fn is_identity(&self) -> bool {
        self.source_w == self.target_w && self.source_h == self.target_h
    }

    /// Map a box from letterbox space back to source pixels: subtract the
    /// pads, divide by the scale, clamp to the source bounds.
    pub fn to_source(&self, bbox: [f32; 4]) -> [f32; 4] {
        let inv = 1.0 / self.scale;
        let map_x = |x: f32| {
            ((x as f64 - self.pad_left as f64) * inv).clamp(0.0, self.source_w as f64) as f32
        };
        let map_y = |y: f32| {
            ((y as f64 - self.pad_top as f64) * inv).clamp(0.0, self.source_h as f64) as f32
        };
        [map_x(bbox[0]), map_y(bbox[1]), map_x(bbox[2]), map_y(bbox[3])]
    }
}

/// Letterbox an interleaved RGB buffer into a `target_w` x `target_h` canvas.
///
/// Returns the canvas buffer together with the transform that produced it.
/// Rejects buffers whose length is not `source_w * source_h * 3`.
pub fn letterbox_rgb(
    data: &[u8],
    source_w: u32,
    source_h: u32,
    target_w: u32,
    target_h: u32,
) -> Result<(Vec<u8>, LetterboxTransform)> {
    let transform = LetterboxTransform::compute(source_w, source_h, target_w, target_h)?;

    let expected = source_w as usize * source_h as usize * RGB_CHANNELS;
    if data.len() != expected {
        return Err(Error::InvalidInput(format!(
            "pixel buffer must be 3-channel RGB: expected {} bytes for {}x{}, got {}",
            expected,
            source_w,
            source_h,
            data.len()
        )));
    }

    // Skip the resizer when the source already fills the visible region
    let scaled = if transform.scaled_w == source_w && transform.scaled_h == source_h {
        data.to_vec()
    } else {
        resize_rgb(
            data,
            source_w,
            source_h,
            transform.scaled_w,
            transform.scaled_h,
        )?
    };

    debug!(
        "Letterbox: {}x{} -> {}x{} (scale {:.4}), pads left={} top={}",
        source_w,
        source_h,
        transform.scaled_w,
        transform.scaled_h,
        transform.scale,
        transform.pad_left,
        transform.pad_top
    );

    let tw = target_w as usize;
    let th = target_h as usize;
    let mut canvas = vec![PAD_VALUE; tw * th * RGB_CHANNELS];

    // Copy per row using slice copies to minimize per-pixel indexing
    let row_bytes = transform.scaled_w as usize * RGB_CHANNELS;
    for row in 0..transform.scaled_h as usize {
        let src_offset = row * row_bytes;
        let dst_offset = ((row + transform.pad_top as usize) * tw
            + transform.pad_left as usize)
            * RGB_CHANNELS;
        canvas[dst_offset..dst_offset + row_bytes]
            .copy_from_slice(&scaled[src_offset..src_offset + row_bytes]);
    }

    Ok((canvas, transform))
}

/// Letterbox an `RgbImage` into a square canvas of side `target_size`.
pub fn letterbox_image(img: &RgbImage, target_size: u32) -> Result<(RgbImage, LetterboxTransform)> {
    let (canvas, transform) =
        letterbox_rgb(img.as_raw(), img.width(), img.height(), target_size, target_size)?;
    let out = RgbImage::from_raw(target_size, target_size, canvas)
        .ok_or_else(|| Error::Processing("letterbox canvas has wrong length".to_string()))?;
    Ok((out, transform))
}

fn resize_rgb(
    data: &[u8],
    source_w: u32,
    source_h: u32,
    target_w: u32,
    target_h: u32,
) -> Result<Vec<u8>> {
    info!(
        "Resizing visible region: {}x{} -> {}x{}",
        source_w, source_h, target_w, target_h
    );
    let resize_options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(source_w, source_h, data.to_vec(), PixelType::U8x3)
        .map_err(Error::external)?;
    let mut dst_image = Image::new(target_w, target_h, PixelType::U8x3);
    resizer
        .resize(&src_image, &mut dst_image, &resize_options)
        .map_err(Error::external)?;

    Ok(dst_image.into_vec())
}
