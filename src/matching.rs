use nalgebra::Vector2;

use crate::region_properties::RegionProperties;

/// An inner lesion paired with the outer lesion around it
#[derive(Debug, Clone, PartialEq)]
pub struct LesionMatch {
    pub inner_label: u32,
    pub outer_label: u32,
    /// Centroid distance in pixels
    pub distance: f64,
}

fn centroid(region: &RegionProperties) -> Vector2<f64> {
    Vector2::new(region.centroid.0, region.centroid.1)
}

/// Index of the region in `candidates` whose centroid is closest to `from`.
/// The first candidate wins exact ties.
fn nearest(from: &RegionProperties, candidates: &[RegionProperties]) -> Option<(usize, f64)> {
    let origin = centroid(from);
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, (centroid(c) - origin).norm()))
        .fold(None, |best, (i, d)| match best {
            Some((_, best_d)) if d >= best_d => best,
            _ => Some((i, d)),
        })
}

/// Pair inner and outer lesions that are each other's nearest neighbour
pub fn match_reciprocal_nearest(inner: &[RegionProperties], outer: &[RegionProperties]) -> Vec<LesionMatch> {
    inner
        .iter()
        .enumerate()
        .filter_map(|(i, inner_region)| {
            let (o, distance) = nearest(inner_region, outer)?;
            let (back, _) = nearest(&outer[o], inner)?;
            (back == i).then(|| LesionMatch {
                inner_label: inner_region.label,
                outer_label: outer[o].label,
                distance,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn at(label: u32, row: f64, col: f64) -> RegionProperties {
        RegionProperties {
            label,
            centroid: (row, col),
            ..RegionProperties::default()
        }
    }

    #[test]
    fn pairs_are_reciprocal() {
        let outer = vec![at(1, 10.0, 10.0), at(2, 50.0, 50.0)];
        let inner = vec![at(1, 11.0, 10.0), at(2, 48.0, 50.0), at(3, 12.0, 10.0)];
        let matches = match_reciprocal_nearest(&inner, &outer);

        assert_eq!(matches.len(), 2);
        assert_eq!((matches[0].inner_label, matches[0].outer_label), (1, 1));
        assert_approx_eq!(matches[0].distance, 1.0);
        assert_eq!((matches[1].inner_label, matches[1].outer_label), (2, 2));
    }

    #[test]
    fn non_reciprocal_neighbours_are_not_paired() {
        let outer = vec![at(1, 0.0, 0.0)];
        let inner = vec![at(1, 5.0, 0.0), at(2, 1.0, 0.0)];
        let matches = match_reciprocal_nearest(&inner, &outer);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].inner_label, 2);
    }

    #[test]
    fn empty_inputs_give_no_matches() {
        assert!(match_reciprocal_nearest(&[], &[at(1, 0.0, 0.0)]).is_empty());
        assert!(match_reciprocal_nearest(&[at(1, 0.0, 0.0)], &[]).is_empty());
    }
}
