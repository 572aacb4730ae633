use log::warn;

use crate::calibration::Calibration;
use crate::errors::{LeafLesionError, Result};
use crate::matching::LesionMatch;
use crate::region_properties::RegionProperties;
use crate::regions::lesion_centres;

/// Measurements for one processed image
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub image_name: String,
    pub leaf_area: u64,
    pub healthy_area: u64,
    pub healthy_region_count: usize,
    pub lesion_count: usize,
    pub lesion_area: u64,
    /// lesion_area / leaf_area; `None` when the leaf area is zero
    pub lesion_coverage: Option<f64>,
    /// Bounding-box centre (row, col) of each lesion
    pub lesion_centres: Vec<(f64, f64)>,
    pub inner_lesion_count: Option<usize>,
    pub inner_lesion_area: Option<u64>,
    pub matched_lesion_count: Option<usize>,
    pub calibration: Option<Calibration>,
}

impl Report {
    /// Physical leaf area when calibrated
    pub fn leaf_area_physical(&self) -> Option<f64> {
        self.calibration.as_ref().map(|c| c.to_physical_area(self.leaf_area))
    }

    pub fn healthy_area_physical(&self) -> Option<f64> {
        self.calibration.as_ref().map(|c| c.to_physical_area(self.healthy_area))
    }

    pub fn lesion_area_physical(&self) -> Option<f64> {
        self.calibration.as_ref().map(|c| c.to_physical_area(self.lesion_area))
    }
}

/// Inner lesion class and its pairing with the outer lesions
#[derive(Debug, Clone, Copy)]
pub struct InnerLesions<'a> {
    pub regions: &'a [RegionProperties],
    pub matches: &'a [LesionMatch],
}

/// lesion_area / leaf_area
pub fn coverage_ratio(lesion_area: u64, leaf_area: u64) -> Result<f64> {
    if leaf_area == 0 {
        return Err(LeafLesionError::DivisionUndefined(
            "leaf area is zero".to_string(),
        ));
    }
    Ok(lesion_area as f64 / leaf_area as f64)
}

fn total_area(regions: &[RegionProperties]) -> u64 {
    regions.iter().map(|r| r.area).sum()
}

/// Aggregate per-region measurements into a report
pub fn build_report(
    image_name: &str,
    leaf: &[RegionProperties],
    healthy: &[RegionProperties],
    lesions: &[RegionProperties],
    inner_lesions: Option<InnerLesions<'_>>,
    calibration: Option<&Calibration>,
) -> Report {
    let leaf_area = total_area(leaf);
    let lesion_area = total_area(lesions);

    let lesion_coverage = match coverage_ratio(lesion_area, leaf_area) {
        Ok(ratio) => Some(ratio),
        Err(e) => {
            warn!("{}: lesion coverage undefined ({})", image_name, e);
            None
        }
    };

    Report {
        image_name: image_name.to_string(),
        leaf_area,
        healthy_area: total_area(healthy),
        healthy_region_count: healthy.len(),
        lesion_count: lesions.len(),
        lesion_area,
        lesion_coverage,
        lesion_centres: lesion_centres(lesions),
        inner_lesion_count: inner_lesions.map(|inner| inner.regions.len()),
        inner_lesion_area: inner_lesions.map(|inner| total_area(inner.regions)),
        matched_lesion_count: inner_lesions.map(|inner| inner.matches.len()),
        calibration: calibration.cloned(),
    }
}
