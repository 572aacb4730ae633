use image::{GrayImage, Luma};
use imageproc::region_labelling::Connectivity;
use log::debug;

use crate::image_utils::{is_foreground, BACKGROUND, FOREGROUND};
use crate::labelling::{component_areas, label_count, label_with_connectivity};

/// Remove small objects, then fill small enclosed holes.
///
/// Objects are 8-connected foreground regions with area below
/// `min_object_area`. Holes are 4-connected background regions that do not
/// touch the image border; a hole is filled when its area is at most
/// `max_hole_area` (equal areas are filled). `None` fills every hole.
pub fn clean(mask: &GrayImage, min_object_area: u64, max_hole_area: Option<u64>) -> GrayImage {
    let without_specks = remove_small_objects(mask, min_object_area);
    fill_holes(&without_specks, max_hole_area)
}

/// Drop 8-connected foreground regions smaller than `min_area`
pub fn remove_small_objects(mask: &GrayImage, min_area: u64) -> GrayImage {
    let labels = label_with_connectivity(mask, Connectivity::Eight);
    let areas = component_areas(&labels);

    let mut out = mask.clone();
    let mut removed = 0usize;
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let label = labels.get_pixel(x, y)[0] as usize;
        if label == 0 {
            *pixel = Luma([BACKGROUND]);
        } else if areas[label] < min_area {
            *pixel = Luma([BACKGROUND]);
            removed += 1;
        } else {
            *pixel = Luma([FOREGROUND]);
        }
    }

    debug!("Removed {} pixels in objects smaller than {}", removed, min_area);
    out
}

/// Fill background regions fully enclosed by foreground
pub fn fill_holes(mask: &GrayImage, max_hole_area: Option<u64>) -> GrayImage {
    let (width, height) = mask.dimensions();

    // Label the background as if it were foreground
    let mut inverted = mask.clone();
    for pixel in inverted.pixels_mut() {
        *pixel = if is_foreground(pixel) { Luma([BACKGROUND]) } else { Luma([FOREGROUND]) };
    }
    let holes = label_with_connectivity(&inverted, Connectivity::Four);
    let areas = component_areas(&holes);

    let mut touches_border = vec![false; label_count(&holes) as usize + 1];
    for (x, y, pixel) in holes.enumerate_pixels() {
        if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
            touches_border[pixel[0] as usize] = true;
        }
    }

    let fillable: Vec<bool> = areas
        .iter()
        .zip(&touches_border)
        .enumerate()
        .map(|(label, (&area, &border))| {
            label != 0 && !border && max_hole_area.map_or(true, |max| area <= max)
        })
        .collect();

    let mut out = mask.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let label = holes.get_pixel(x, y)[0] as usize;
        *pixel = if label == 0 || fillable[label] {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        };
    }
    out
}
