use image::{RgbImage, imageops};

use crate::detector::Detection;

/// Extract one crop per source-space detection from the original-resolution
/// image. Boxes are clamped to the image bounds; boxes that collapse to zero
/// area after clamping yield no crop.
pub fn crop_detections(original: &RgbImage, detections: &[Detection]) -> Vec<RgbImage> {
    detections
        .iter()
        .filter_map(|det| crop_region(original, det.bbox()))
        .collect()
}

fn crop_region(img: &RgbImage, bbox: [f32; 4]) -> Option<RgbImage> {
    let (iw, ih) = (img.width(), img.height());

    let x1 = bbox[0].floor().max(0.0) as u32;
    let y1 = bbox[1].floor().max(0.0) as u32;
    let x2 = (bbox[2].ceil().max(0.0) as u32).min(iw);
    let y2 = (bbox[3].ceil().max(0.0) as u32).min(ih);

    if x1 >= x2 || y1 >= y2 {
        return None;
    }

    Some(imageops::crop_imm(img, x1, y1, x2 - x1, y2 - y1).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn det(bbox: [f32; 4]) -> Detection {
        Detection {
            x1: bbox[0],
            y1: bbox[1],
            x2: bbox[2],
            y2: bbox[3],
            class_id: 0,
            label: "face".to_string(),
            confidence: 0.8,
        }
    }

    #[test]
    fn crop_has_box_dimensions() {
        let img = RgbImage::from_pixel(100, 80, Rgb([9, 9, 9]));
        let crops = crop_detections(&img, &[det([10.0, 20.0, 50.0, 60.0])]);
        assert_eq!(crops.len(), 1);
        assert_eq!((crops[0].width(), crops[0].height()), (40, 40));
    }

    #[test]
    fn crop_is_clamped_to_image() {
        let img = RgbImage::from_pixel(50, 50, Rgb([1, 2, 3]));
        let crops = crop_detections(&img, &[det([-10.0, -10.0, 200.0, 200.0])]);
        assert_eq!(crops.len(), 1);
        assert_eq!((crops[0].width(), crops[0].height()), (50, 50));
    }

    #[test]
    fn zero_area_box_yields_no_crop() {
        let img = RgbImage::from_pixel(50, 50, Rgb([1, 2, 3]));
        let crops = crop_detections(&img, &[det([60.0, 60.0, 70.0, 70.0])]);
        assert!(crops.is_empty());
    }

    #[test]
    fn crop_pixels_come_from_source_region() {
        let img = RgbImage::from_fn(8, 8, |x, y| Rgb([x as u8, y as u8, 0]));
        let crops = crop_detections(&img, &[det([2.0, 3.0, 5.0, 6.0])]);
        assert_eq!(crops[0].get_pixel(0, 0), &Rgb([2, 3, 0]));
    }
}
