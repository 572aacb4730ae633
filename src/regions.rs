// Domain pipelines: which pixels are leaf, healthy tissue, lesion or scale card

use log::{debug, info};

use crate::color_space::HsvImage;
use crate::errors::Result;
use crate::filter_settings::{FilterSetting, FilterSettings, HEALTHY_AREA, LEAF_AREA, SCALE_CARD};
use crate::image_utils::{label_map_to_mask, mask_and};
use crate::labelling::{clean_labelled_mask, label, label_non_empty, LabelMap};
use crate::morphology::{clean, fill_holes};
use crate::region_filter::{filter_regions, is_long_and_large, is_not_small, RegionPredicate};
use crate::region_properties::{extract_properties, RegionProperties};
use crate::threshold::{threshold, BinaryMask};

/// Intermediate and final products of one domain pipeline
#[derive(Debug, Clone)]
pub struct RegionSet {
    /// Mask the labels were computed from
    pub mask: BinaryMask,
    /// Labels of the regions that passed filtering
    pub labels: LabelMap,
    /// Every labelled region before filtering
    pub candidates: Vec<RegionProperties>,
    /// Regions that passed filtering
    pub regions: Vec<RegionProperties>,
}

impl RegionSet {
    /// Total pixel area of the retained regions
    pub fn total_area(&self) -> u64 {
        self.regions.iter().map(|r| r.area).sum()
    }

    /// Mask of the retained regions only
    pub fn region_mask(&self) -> BinaryMask {
        label_map_to_mask(&self.labels)
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Label, describe and filter a prepared mask
fn collect_regions(
    mask: BinaryMask,
    hsv: &HsvImage,
    keep_largest_only: bool,
    predicates: &[RegionPredicate],
) -> Result<RegionSet> {
    let all_labels = label(&mask, keep_largest_only);
    let candidates = extract_properties(&all_labels, hsv)?;
    let regions = filter_regions(&candidates, predicates);
    let labels = clean_labelled_mask(&all_labels, &regions);

    Ok(RegionSet {
        mask,
        labels,
        candidates,
        regions,
    })
}

/// Predicates configured by a setting's scalar thresholds
fn setting_predicates(setting: &FilterSetting) -> Vec<RegionPredicate> {
    let min_area = setting.min_area.unwrap_or(0);
    match setting.min_axis_ratio {
        Some(ratio) => vec![is_long_and_large(min_area, ratio)],
        None => vec![is_not_small(min_area)],
    }
}

/// The leaf: broad plant-tissue bounds, generous cleaning, largest object only
pub fn leaf_regions(hsv: &HsvImage, settings: &FilterSettings) -> Result<RegionSet> {
    let setting = settings.get(LEAF_AREA)?;
    let raw = threshold(hsv, &setting.bounds());
    let cleaned = clean(&raw, setting.min_area.unwrap_or(0), setting.max_hole_area);

    let leaf = collect_regions(cleaned, hsv, true, &[])?;
    info!("Leaf: {} pixels", leaf.total_area());
    Ok(leaf)
}

/// Healthy tissue: healthy bounds restricted to leaf pixels.
///
/// No hole filling: the holes of the healthy mask are the lesions.
pub fn healthy_regions(hsv: &HsvImage, settings: &FilterSettings, leaf: &RegionSet) -> Result<RegionSet> {
    let setting = settings.get(HEALTHY_AREA)?;
    let raw = threshold(hsv, &setting.bounds());
    let on_leaf = mask_and(&raw, &leaf.region_mask())?;

    let healthy = collect_regions(on_leaf, hsv, false, &setting_predicates(setting))?;
    info!(
        "Healthy: {} regions, {} pixels",
        healthy.regions.len(),
        healthy.total_area()
    );
    Ok(healthy)
}

/// Lesions of the class named `setting_name`, restricted to leaf pixels,
/// with enclosed holes filled up to the setting's `max_hole_area`
pub fn lesion_regions(
    hsv: &HsvImage,
    settings: &FilterSettings,
    leaf: &RegionSet,
    setting_name: &str,
) -> Result<RegionSet> {
    let setting = settings.get(setting_name)?;
    let raw = threshold(hsv, &setting.bounds());
    let on_leaf = mask_and(&raw, &leaf.region_mask())?;
    let filled = fill_holes(&on_leaf, setting.max_hole_area);

    let lesions = collect_regions(filled, hsv, false, &setting_predicates(setting))?;
    info!(
        "{}: {} of {} candidate regions kept, {} pixels",
        setting_name,
        lesions.regions.len(),
        lesions.candidates.len(),
        lesions.total_area()
    );
    Ok(lesions)
}

/// Bounding-box centre (row, col) of each lesion, for annotation
pub fn lesion_centres(lesions: &[RegionProperties]) -> Vec<(f64, f64)> {
    lesions.iter().map(|r| r.bbox.centre()).collect()
}

/// The scale card: the largest object within the card's colour bounds.
///
/// With `required` an image without any card-coloured pixel is an
/// `EmptyMask` error; otherwise an empty set is returned.
pub fn scale_card_region(hsv: &HsvImage, settings: &FilterSettings, required: bool) -> Result<RegionSet> {
    let setting = settings.get(SCALE_CARD)?;
    let raw = threshold(hsv, &setting.bounds());

    let all_labels = if required {
        label_non_empty(&raw, true)?
    } else {
        label(&raw, true)
    };
    let candidates = extract_properties(&all_labels, hsv)?;
    debug!("Scale card candidates: {}", candidates.len());

    Ok(RegionSet {
        mask: raw,
        labels: all_labels,
        regions: candidates.clone(),
        candidates,
    })
}
