use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use log::debug;

use crate::errors::{LeafLesionError, Result};
use crate::image_utils::{is_foreground, BACKGROUND, FOREGROUND};
use crate::region_properties::RegionProperties;

/// Per-pixel component labels, 0 is background
pub type LabelMap = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Label the 8-connected regions of a mask.
///
/// Labels are contiguous from 1 in raster order of each region's first
/// pixel. With `keep_largest_only` a single region (the largest, lowest label
/// on ties) survives as label 1.
pub fn label(mask: &GrayImage, keep_largest_only: bool) -> LabelMap {
    let labels = label_with_connectivity(mask, Connectivity::Eight);
    if keep_largest_only {
        keep_largest(&labels)
    } else {
        labels
    }
}

/// Like [`label`] but fails with `EmptyMask` when nothing is selected
pub fn label_non_empty(mask: &GrayImage, keep_largest_only: bool) -> Result<LabelMap> {
    if !mask.pixels().any(is_foreground) {
        return Err(LeafLesionError::EmptyMask(format!(
            "{}x{} mask has no foreground pixels",
            mask.width(),
            mask.height()
        )));
    }
    Ok(label(mask, keep_largest_only))
}

/// Connected-component labelling with canonical raster-order labels
pub(crate) fn label_with_connectivity(mask: &GrayImage, connectivity: Connectivity) -> LabelMap {
    // Components are split on pixel value, so collapse every non-zero value first
    let (width, height) = mask.dimensions();
    let binary: GrayImage = ImageBuffer::from_fn(width, height, |x, y| {
        if is_foreground(mask.get_pixel(x, y)) {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    });

    let raw = connected_components(&binary, connectivity, Luma([BACKGROUND]));
    relabel(&raw)
}

/// Renumber labels contiguously from 1 in raster order of first occurrence
pub fn relabel(labels: &LabelMap) -> LabelMap {
    let max_label = label_count(labels) as usize;
    let mut mapping = vec![0u32; max_label + 1];
    let mut next = 1u32;

    let mut out = labels.clone();
    for pixel in out.pixels_mut() {
        let old = pixel[0] as usize;
        if old == 0 {
            continue;
        }
        if mapping[old] == 0 {
            mapping[old] = next;
            next += 1;
        }
        pixel[0] = mapping[old];
    }
    out
}

/// Highest label present (0 for an empty map)
pub fn label_count(labels: &LabelMap) -> u32 {
    labels.pixels().map(|p| p[0]).max().unwrap_or(0)
}

/// Pixel count per label, indexed by label (index 0 is background)
pub fn component_areas(labels: &LabelMap) -> Vec<u64> {
    let mut areas = vec![0u64; label_count(labels) as usize + 1];
    for pixel in labels.pixels() {
        areas[pixel[0] as usize] += 1;
    }
    areas
}

/// Label of the largest component; the lowest label wins exact ties
pub fn largest_label(labels: &LabelMap) -> Option<u32> {
    let areas = component_areas(labels);
    let mut best: Option<(u32, u64)> = None;

    for (label, &area) in areas.iter().enumerate().skip(1) {
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((label as u32, area)),
        }
    }

    best.map(|(label, _)| label)
}

/// Keep only the largest component, relabelled to 1
pub fn keep_largest(labels: &LabelMap) -> LabelMap {
    let Some(largest) = largest_label(labels) else {
        return labels.clone();
    };

    debug!(
        "Keeping largest component {} of {}",
        largest,
        label_count(labels)
    );

    let mut out = labels.clone();
    for pixel in out.pixels_mut() {
        pixel[0] = if pixel[0] == largest { 1 } else { 0 };
    }
    out
}

/// Zero every label that is not among `keep`
pub fn clean_labelled_mask(labels: &LabelMap, keep: &[RegionProperties]) -> LabelMap {
    let max_label = label_count(labels) as usize;
    let mut retained = vec![false; max_label + 1];
    for region in keep {
        if let Some(slot) = retained.get_mut(region.label as usize) {
            *slot = true;
        }
    }

    let mut out = labels.clone();
    for pixel in out.pixels_mut() {
        if !retained[pixel[0] as usize] {
            pixel[0] = 0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_utils::mask_from_rows;

    fn four_squares() -> GrayImage {
        mask_from_rows(&[
            "........",
            ".##..##.",
            ".##..##.",
            "........",
            "........",
            ".##..##.",
            ".##..##.",
            "........",
            "........",
        ])
    }

    #[test]
    fn labels_are_contiguous_in_raster_order() {
        let labels = label(&four_squares(), false);
        assert_eq!(label_count(&labels), 4);
        assert_eq!(labels.get_pixel(1, 1)[0], 1);
        assert_eq!(labels.get_pixel(5, 1)[0], 2);
        assert_eq!(labels.get_pixel(1, 5)[0], 3);
        assert_eq!(labels.get_pixel(6, 6)[0], 4);
        assert_eq!(labels.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn diagonal_neighbours_are_connected() {
        let mask = mask_from_rows(&["#..", ".#.", "..#"]);
        assert_eq!(label_count(&label(&mask, false)), 1);
    }

    #[test]
    fn keep_largest_leaves_one_maximal_label() {
        let mask = mask_from_rows(&["##...#", "##....", "......", "...###"]);
        let all = label(&mask, false);
        let areas = component_areas(&all);
        let largest = label(&mask, true);

        assert_eq!(label_count(&largest), 1);
        let kept_area = component_areas(&largest)[1];
        assert!(areas.iter().skip(1).all(|&a| kept_area >= a));
        assert_eq!(kept_area, 4);
        assert_eq!(largest.get_pixel(0, 0)[0], 1);
        assert_eq!(largest.get_pixel(5, 0)[0], 0);
    }

    #[test]
    fn keep_largest_tie_goes_to_first_region() {
        let largest = label(&four_squares(), true);
        assert_eq!(label_count(&largest), 1);
        assert_eq!(largest.get_pixel(1, 1)[0], 1);
        assert_eq!(largest.get_pixel(5, 1)[0], 0);
    }

    #[test]
    fn empty_mask_is_rejected_when_required() {
        let mask = GrayImage::new(4, 4);
        assert!(matches!(label_non_empty(&mask, true), Err(LeafLesionError::EmptyMask(_))));
        assert_eq!(label_count(&label(&mask, true)), 0);
    }

    #[test]
    fn clean_labelled_mask_drops_unlisted_labels() {
        let labels = label(&four_squares(), false);
        let keep: Vec<RegionProperties> = (1..=3)
            .map(|l| RegionProperties { label: l, ..RegionProperties::default() })
            .collect();
        let cleaned = clean_labelled_mask(&labels, &keep);
        assert_eq!(label_count(&cleaned), 3);
        assert_eq!(cleaned.get_pixel(6, 6)[0], 0);
    }
}
