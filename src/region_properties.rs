use nalgebra::Matrix2;

use crate::color_space::HsvImage;
use crate::errors::{LeafLesionError, Result};
use crate::labelling::{label_count, LabelMap};

/// Bounding box in pixel coordinates; `max_row`/`max_col` are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
}

impl BoundingBox {
    pub fn height(&self) -> u32 {
        self.max_row - self.min_row
    }

    pub fn width(&self) -> u32 {
        self.max_col - self.min_col
    }

    /// Centre (row, col) of the box in pixel coordinates
    pub fn centre(&self) -> (f64, f64) {
        (
            (self.min_row + self.max_row) as f64 / 2.0 - 0.5,
            (self.min_col + self.max_col) as f64 / 2.0 - 0.5,
        )
    }
}

/// Geometric and intensity descriptors of one labelled region
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionProperties {
    pub label: u32,
    pub area: u64,
    pub bbox: BoundingBox,
    /// Mean (row, col) of the region's pixels
    pub centroid: (f64, f64),
    pub major_axis_length: f64,
    pub minor_axis_length: f64,
    /// Mean H, S, V over the region's pixels
    pub mean_intensity: [f64; 3],
    /// major / minor, +inf when the minor axis is 0
    pub axis_ratio: f64,
}

#[derive(Clone)]
struct Accumulator {
    count: u64,
    sum_row: f64,
    sum_col: f64,
    sum_row_row: f64,
    sum_col_col: f64,
    sum_row_col: f64,
    sum_intensity: [f64; 3],
    bbox: BoundingBox,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            count: 0,
            sum_row: 0.0,
            sum_col: 0.0,
            sum_row_row: 0.0,
            sum_col_col: 0.0,
            sum_row_col: 0.0,
            sum_intensity: [0.0; 3],
            bbox: BoundingBox {
                min_row: u32::MAX,
                min_col: u32::MAX,
                max_row: 0,
                max_col: 0,
            },
        }
    }

    fn add(&mut self, row: u32, col: u32, intensity: [f32; 3]) {
        let (r, c) = (row as f64, col as f64);
        self.count += 1;
        self.sum_row += r;
        self.sum_col += c;
        self.sum_row_row += r * r;
        self.sum_col_col += c * c;
        self.sum_row_col += r * c;
        for (sum, value) in self.sum_intensity.iter_mut().zip(intensity) {
            *sum += value as f64;
        }

        self.bbox.min_row = self.bbox.min_row.min(row);
        self.bbox.min_col = self.bbox.min_col.min(col);
        self.bbox.max_row = self.bbox.max_row.max(row + 1);
        self.bbox.max_col = self.bbox.max_col.max(col + 1);
    }

    fn finish(&self, label: u32) -> RegionProperties {
        let n = self.count as f64;
        let mean_row = self.sum_row / n;
        let mean_col = self.sum_col / n;

        // Normalized second central moments
        let mu_rr = (self.sum_row_row / n - mean_row * mean_row).max(0.0);
        let mu_cc = (self.sum_col_col / n - mean_col * mean_col).max(0.0);
        let mu_rc = self.sum_row_col / n - mean_row * mean_col;

        let (major, minor) = equivalent_ellipse_axes(&Matrix2::new(mu_rr, -mu_rc, -mu_rc, mu_cc));

        RegionProperties {
            label,
            area: self.count,
            bbox: self.bbox,
            centroid: (mean_row, mean_col),
            major_axis_length: major,
            minor_axis_length: minor,
            mean_intensity: self.sum_intensity.map(|s| s / n),
            axis_ratio: axis_ratio(major, minor),
        }
    }
}

/// Major and minor axis lengths (4 * sqrt of the inertia tensor eigenvalues)
fn equivalent_ellipse_axes(inertia: &Matrix2<f64>) -> (f64, f64) {
    let half_trace = inertia.trace() / 2.0;
    let discriminant = (half_trace * half_trace - inertia.determinant()).max(0.0).sqrt();
    let larger = (half_trace + discriminant).max(0.0);
    let smaller = (half_trace - discriminant).max(0.0);
    (4.0 * larger.sqrt(), 4.0 * smaller.sqrt())
}

/// Long-to-short axis ratio; a zero minor axis gives +inf
pub fn axis_ratio(major: f64, minor: f64) -> f64 {
    if minor == 0.0 {
        f64::INFINITY
    } else {
        major / minor
    }
}

/// Describe every labelled region, in ascending label order.
///
/// Labels that do not occur in the map produce no entry.
pub fn extract_properties(labels: &LabelMap, intensity: &HsvImage) -> Result<Vec<RegionProperties>> {
    if labels.dimensions() != intensity.dimensions() {
        return Err(LeafLesionError::InvalidShape(format!(
            "label map {:?} does not match intensity image {:?}",
            labels.dimensions(),
            intensity.dimensions()
        )));
    }

    let mut accumulators = vec![Accumulator::new(); label_count(labels) as usize + 1];
    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel[0] as usize;
        if label != 0 {
            accumulators[label].add(y, x, intensity.get_pixel(x, y).0);
        }
    }

    Ok(accumulators
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, acc)| acc.count > 0)
        .map(|(label, acc)| acc.finish(label as u32))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_utils::mask_from_rows;
    use crate::labelling::label;
    use assert_approx_eq::assert_approx_eq;
    use image::Rgb;

    fn props_for(rows: &[&str]) -> Vec<RegionProperties> {
        let mask = mask_from_rows(rows);
        let hsv = HsvImage::from_pixel(mask.width(), mask.height(), Rgb([0.2, 0.4, 0.6]));
        extract_properties(&label(&mask, false), &hsv).unwrap()
    }

    #[test]
    fn square_block_is_round() {
        let props = props_for(&[".....", ".###.", ".###.", ".###.", "....."]);
        assert_eq!(props.len(), 1);
        let p = &props[0];
        assert_eq!(p.label, 1);
        assert_eq!(p.area, 9);
        assert_eq!(p.bbox, BoundingBox { min_row: 1, min_col: 1, max_row: 4, max_col: 4 });
        assert_approx_eq!(p.centroid.0, 2.0);
        assert_approx_eq!(p.centroid.1, 2.0);
        assert_approx_eq!(p.major_axis_length, 4.0 * (2.0f64 / 3.0).sqrt());
        assert_approx_eq!(p.minor_axis_length, p.major_axis_length);
        assert_approx_eq!(p.axis_ratio, 1.0);
        assert_eq!(p.bbox.centre(), (2.0, 2.0));
    }

    #[test]
    fn single_row_region_has_infinite_ratio() {
        let props = props_for(&["......", ".####.", "......"]);
        let p = &props[0];
        assert_eq!(p.bbox.height(), 1);
        assert_eq!(p.minor_axis_length, 0.0);
        assert!(p.major_axis_length > 0.0);
        assert!(p.axis_ratio.is_infinite() && p.axis_ratio > 0.0);
    }

    #[test]
    fn elongated_region_has_large_ratio() {
        let props = props_for(&["##########", "##########"]);
        assert!(props[0].axis_ratio > 4.0);
        assert!(props[0].major_axis_length > props[0].minor_axis_length);
    }

    #[test]
    fn mean_intensity_only_covers_region_pixels() {
        let mask = mask_from_rows(&["#.", ".."]);
        let mut hsv = HsvImage::from_pixel(2, 2, Rgb([1.0, 1.0, 1.0]));
        hsv.put_pixel(0, 0, Rgb([0.25, 0.5, 0.75]));
        let props = extract_properties(&label(&mask, false), &hsv).unwrap();

        assert_approx_eq!(props[0].mean_intensity[0], 0.25);
        assert_approx_eq!(props[0].mean_intensity[1], 0.5);
        assert_approx_eq!(props[0].mean_intensity[2], 0.75);
    }

    #[test]
    fn properties_follow_label_order() {
        let props = props_for(&["#..#", "....", "#..#"]);
        let labels: Vec<u32> = props.iter().map(|p| p.label).collect();
        assert_eq!(labels, vec![1, 2, 3, 4]);
        assert!(props.iter().all(|p| p.area == 1));
    }

    #[test]
    fn mismatched_intensity_is_invalid_shape() {
        let labels = label(&mask_from_rows(&["#."]), false);
        let hsv = HsvImage::new(3, 3);
        assert!(matches!(
            extract_properties(&labels, &hsv),
            Err(LeafLesionError::InvalidShape(_))
        ));
    }
}
