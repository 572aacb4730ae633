use crate::region_properties::RegionProperties;

/// A boolean criterion over one region
pub type RegionPredicate = Box<dyn Fn(&RegionProperties) -> bool + Send + Sync>;

/// Keep regions that satisfy every predicate, preserving order.
///
/// Evaluation stops at the first failing predicate for each region.
pub fn filter_regions(properties: &[RegionProperties], predicates: &[RegionPredicate]) -> Vec<RegionProperties> {
    properties
        .iter()
        .filter(|region| predicates.iter().all(|predicate| predicate(*region)))
        .cloned()
        .collect()
}

/// area >= min_area
pub fn is_not_small(min_area: u64) -> RegionPredicate {
    Box::new(move |region: &RegionProperties| region.area >= min_area)
}

/// area >= min_area and axis ratio >= min_axis_ratio (elongated streaks)
pub fn is_long_and_large(min_area: u64, min_axis_ratio: f64) -> RegionPredicate {
    Box::new(move |region: &RegionProperties| {
        region.area >= min_area && region.axis_ratio >= min_axis_ratio
    })
}
