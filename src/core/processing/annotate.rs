use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detector::Detection;

/// Per-class box colors, cycled by class id.
const PALETTE: [[u8; 3]; 6] = [
    [255, 56, 56],
    [61, 219, 134],
    [52, 147, 235],
    [255, 190, 37],
    [211, 56, 255],
    [56, 231, 255],
];

const BOX_THICKNESS: u32 = 2;

/// Draw hollow rectangles for source-space detections onto `image`.
///
/// Boxes are clamped to the image bounds; degenerate boxes are skipped.
pub fn draw_detections(image: &mut RgbImage, detections: &[Detection]) {
    for det in detections {
        let color = PALETTE[det.class_id % PALETTE.len()];
        draw_box(image, det.bbox(), Rgb(color));
    }
}

fn draw_box(image: &mut RgbImage, bbox: [f32; 4], color: Rgb<u8>) {
    let w = image.width() as i64;
    let h = image.height() as i64;

    let x1 = (bbox[0].floor() as i64).clamp(0, w - 1);
    let y1 = (bbox[1].floor() as i64).clamp(0, h - 1);
    let x2 = (bbox[2].ceil() as i64).clamp(0, w - 1);
    let y2 = (bbox[3].ceil() as i64).clamp(0, h - 1);

    if x2 <= x1 || y2 <= y1 {
        return;
    }

    for t in 0..BOX_THICKNESS as i64 {
        let bx = x1 + t;
        let by = y1 + t;
        let bw = (x2 - t).saturating_sub(bx);
        let bh = (y2 - t).saturating_sub(by);
        if bw < 1 || bh < 1 {
            break;
        }
        let rect = Rect::at(bx as i32, by as i32).of_size(bw as u32, bh as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Detection;

    #[test]
    fn draws_box_edges() {
        let mut img = RgbImage::from_pixel(64, 64, Rgb([0, 0, 0]));
        let det = Detection {
            x1: 10.0,
            y1: 10.0,
            x2: 30.0,
            y2: 30.0,
            class_id: 0,
            label: "face".to_string(),
            confidence: 0.9,
        };
        draw_detections(&mut img, &[det]);

        assert_ne!(*img.get_pixel(10, 10), Rgb([0, 0, 0]));
        assert_ne!(*img.get_pixel(20, 10), Rgb([0, 0, 0]));
        assert_ne!(*img.get_pixel(10, 20), Rgb([0, 0, 0]));
        // Interior untouched
        assert_eq!(*img.get_pixel(20, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn out_of_bounds_box_is_clamped_not_panicking() {
        let mut img = RgbImage::from_pixel(32, 32, Rgb([0, 0, 0]));
        let det = Detection {
            x1: -20.0,
            y1: -20.0,
            x2: 500.0,
            y2: 500.0,
            class_id: 1,
            label: "face".to_string(),
            confidence: 0.5,
        };
        draw_detections(&mut img, &[det]);
        assert_ne!(*img.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn degenerate_box_is_skipped() {
        let mut img = RgbImage::from_pixel(16, 16, Rgb([0, 0, 0]));
        let det = Detection {
            x1: 8.0,
            y1: 8.0,
            x2: 8.0,
            y2: 8.0,
            class_id: 0,
            label: "face".to_string(),
            confidence: 0.5,
        };
        draw_detections(&mut img, &[det]);
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
