use image::{GrayImage, Rgb, RgbImage};
use tracing::debug;

/// Global histogram equalization over luma, replicated into all three
/// channels. Improves detection sensitivity on under-exposed images.
///
/// The remapping is the standard CDF flattening: monotonic non-decreasing,
/// and the identity for an already-uniform luma histogram.
pub fn equalize_rgb(img: &RgbImage) -> RgbImage {
    let gray = luma_of(img);
    let lut = equalization_lut(&gray);

    let mut out = RgbImage::new(img.width(), img.height());
    for (dst, src) in out.pixels_mut().zip(gray.pixels()) {
        let v = lut[src[0] as usize];
        *dst = Rgb([v, v, v]);
    }
    out
}

/// BT.601 integer luma (299/587/114 weights). Exact for gray pixels.
pub fn luma_of(img: &RgbImage) -> GrayImage {
    let mut gray = GrayImage::new(img.width(), img.height());
    for (dst, src) in gray.pixels_mut().zip(img.pixels()) {
        let y = (299 * src[0] as u32 + 587 * src[1] as u32 + 114 * src[2] as u32) / 1000;
        dst[0] = y as u8;
    }
    gray
}

/// Build the 256-entry equalization lookup table from a grayscale image.
///
/// `lut[v] = round((cdf(v) - cdf_min) / (total - cdf_min) * 255)`, the
/// classic global-equalization mapping. Degenerate single-level images map
/// to themselves.
pub fn equalization_lut(gray: &GrayImage) -> [u8; 256] {
    let mut hist = [0u64; 256];
    for px in gray.pixels() {
        hist[px[0] as usize] += 1;
    }

    let mut cdf = [0u64; 256];
    let mut running = 0u64;
    for (i, &count) in hist.iter().enumerate() {
        running += count;
        cdf[i] = running;
    }
    let total = running;

    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);

    let mut lut = [0u8; 256];
    if total == 0 || total == cdf_min {
        // Empty or single-level histogram: nothing to stretch
        for (i, entry) in lut.iter_mut().enumerate() {
            *entry = i as u8;
        }
        return lut;
    }

    debug!("Equalizing luma histogram over {} pixels", total);
    let denom = (total - cdf_min) as f64;
    for i in 0..256 {
        if cdf[i] < cdf_min {
            lut[i] = 0;
            continue;
        }
        let mapped = ((cdf[i] - cdf_min) as f64 / denom * 255.0).round();
        lut[i] = mapped.clamp(0.0, 255.0) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// 256x256 image with every luma level appearing exactly 256 times.
    fn uniform_gradient() -> RgbImage {
        RgbImage::from_fn(256, 256, |x, _| {
            let v = x as u8;
            Rgb([v, v, v])
        })
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = RgbImage::from_pixel(31, 47, Rgb([40, 90, 130]));
        let eq = equalize_rgb(&img);
        assert_eq!((eq.width(), eq.height()), (31, 47));
    }

    #[test]
    fn gray_pixels_keep_their_luma() {
        let img = RgbImage::from_pixel(4, 4, Rgb([137, 137, 137]));
        let gray = luma_of(&img);
        assert_eq!(gray.get_pixel(0, 0), &Luma([137]));
    }

    #[test]
    fn uniform_histogram_is_fixed_point() {
        let img = uniform_gradient();
        let eq = equalize_rgb(&img);
        assert_eq!(img, eq);
    }

    #[test]
    fn lut_is_monotonic_non_decreasing() {
        let img = RgbImage::from_fn(64, 64, |x, y| {
            let v = ((x * y) % 200) as u8;
            Rgb([v, v, v])
        });
        let lut = equalization_lut(&luma_of(&img));
        for w in lut.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn stretches_low_contrast_range() {
        // Two-level image: equalization should push the levels apart
        let img = RgbImage::from_fn(32, 32, |x, _| {
            let v = if x < 16 { 100 } else { 110 };
            Rgb([v, v, v])
        });
        let eq = equalize_rgb(&img);
        let lo = eq.get_pixel(0, 0)[0];
        let hi = eq.get_pixel(31, 0)[0];
        assert!(hi as i32 - lo as i32 > 100);
    }

    #[test]
    fn single_level_image_unchanged() {
        let gray = GrayImage::from_pixel(8, 8, Luma([77]));
        let lut = equalization_lut(&gray);
        assert_eq!(lut[77], 77);
    }
}
