use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::image_utils::is_foreground;
use crate::region_properties::RegionProperties;
use crate::regions::RegionSet;

/// Colours used when annotating an image
#[derive(Debug, Clone, Copy)]
pub struct OverlayColors {
    pub healthy: [u8; 3],
    pub lesion: [u8; 3],
    pub scale_card: [u8; 3],
}

/// Blend `color` into every masked pixel of `canvas`
fn tint_regions(canvas: &mut RgbImage, regions: &RegionSet, color: [u8; 3]) {
    let mask = regions.region_mask();
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        if is_foreground(mask.get_pixel(x, y)) {
            for c in 0..3 {
                pixel[c] = ((pixel[c] as u16 + color[c] as u16) / 2) as u8;
            }
        }
    }
}

fn draw_boxes(canvas: &mut RgbImage, regions: &[RegionProperties], color: [u8; 3]) {
    for region in regions {
        let bbox = &region.bbox;
        if bbox.width() == 0 || bbox.height() == 0 {
            continue;
        }
        let rect = Rect::at(bbox.min_col as i32, bbox.min_row as i32).of_size(bbox.width(), bbox.height());
        draw_hollow_rect_mut(canvas, rect, Rgb(color));
    }
}

/// Annotate an RGB image with lesion tint, region boxes and lesion centres
pub fn render_overlay(
    rgb: &RgbImage,
    healthy: &RegionSet,
    lesions: &RegionSet,
    scale_card: Option<&RegionSet>,
    colors: &OverlayColors,
) -> RgbImage {
    let mut canvas = rgb.clone();

    tint_regions(&mut canvas, lesions, colors.lesion);
    draw_boxes(&mut canvas, &healthy.regions, colors.healthy);
    draw_boxes(&mut canvas, &lesions.regions, colors.lesion);
    if let Some(card) = scale_card {
        draw_boxes(&mut canvas, &card.regions, colors.scale_card);
    }

    for region in &lesions.regions {
        let (row, col) = region.bbox.centre();
        draw_cross_mut(&mut canvas, Rgb(colors.lesion), col.round() as i32, row.round() as i32);
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_utils::mask_from_rows;
    use crate::labelling::label;
    use crate::region_properties::extract_properties;
    use crate::color_space::HsvImage;

    fn region_set(rows: &[&str]) -> RegionSet {
        let mask = mask_from_rows(rows);
        let labels = label(&mask, false);
        let hsv = HsvImage::new(mask.width(), mask.height());
        let regions = extract_properties(&labels, &hsv).unwrap();
        RegionSet {
            mask,
            labels,
            candidates: regions.clone(),
            regions,
        }
    }

    #[test]
    fn lesion_pixels_are_tinted_and_boxed() {
        let rgb = RgbImage::from_pixel(7, 7, Rgb([0, 0, 0]));
        let lesions = region_set(&[
            ".......",
            ".###...",
            ".###...",
            ".###...",
            ".......",
            ".......",
            ".......",
        ]);
        let healthy = region_set(&[".......", ".......", ".......", ".......", ".......", ".......", "......."]);
        let colors = OverlayColors {
            healthy: [0, 255, 0],
            lesion: [200, 100, 0],
            scale_card: [0, 0, 255],
        };

        let overlay = render_overlay(&rgb, &healthy, &lesions, None, &colors);

        assert_eq!(overlay.dimensions(), rgb.dimensions());
        // box outline
        assert_eq!(overlay.get_pixel(1, 1), &Rgb([200, 100, 0]));
        // untouched background
        assert_eq!(overlay.get_pixel(6, 6), &Rgb([0, 0, 0]));
    }
}
