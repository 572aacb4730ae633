use crate::errors::{LeafLesionError, Result};

/// Pixel-to-physical conversion derived from a square scale card
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    /// Known side length of the card in `unit`
    pub side_length: f64,
    pub unit: String,
    pub card_area_pixels: u64,
    /// Pixels along one unit of length
    pub pixels_per_unit: f64,
    /// Physical area (unit²) covered by one pixel
    pub area_per_pixel: f64,
}

impl Calibration {
    /// Calibrate from the pixel area of a square card of known side length
    pub fn from_card_area(card_area_pixels: u64, side_length: f64, unit: &str) -> Result<Self> {
        if card_area_pixels == 0 {
            return Err(LeafLesionError::DivisionUndefined(
                "scale card has zero pixel area".to_string(),
            ));
        }
        if !(side_length > 0.0) {
            return Err(LeafLesionError::DivisionUndefined(format!(
                "scale card side length {} is not positive",
                side_length
            )));
        }

        let pixels_per_unit = (card_area_pixels as f64).sqrt() / side_length;
        Ok(Self {
            side_length,
            unit: unit.to_string(),
            card_area_pixels,
            pixels_per_unit,
            area_per_pixel: side_length * side_length / card_area_pixels as f64,
        })
    }

    /// Physical area of a pixel count, in unit²
    pub fn to_physical_area(&self, pixels: u64) -> f64 {
        pixels as f64 * self.area_per_pixel
    }
}

/// Convert a pixel count to physical area given pixels per unit length
pub fn pixel_area_to_physical(pixels: f64, pixels_per_unit: f64) -> Result<f64> {
    if pixels_per_unit == 0.0 {
        return Err(LeafLesionError::DivisionUndefined(
            "pixels per unit is zero".to_string(),
        ));
    }
    Ok(pixels / (pixels_per_unit * pixels_per_unit))
}

/// Convert a physical area back to a pixel count given pixels per unit length
pub fn physical_area_to_pixels(area: f64, pixels_per_unit: f64) -> f64 {
    area * pixels_per_unit * pixels_per_unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn card_of_400_pixels_and_side_2() {
        let calibration = Calibration::from_card_area(400, 2.0, "cm").unwrap();
        assert_approx_eq!(calibration.pixels_per_unit, 10.0);
        assert_approx_eq!(calibration.area_per_pixel, 0.01);
        assert_approx_eq!(calibration.to_physical_area(1000), 10.0);
    }

    #[test]
    fn zero_area_card_is_undefined() {
        assert!(matches!(
            Calibration::from_card_area(0, 5.0, "cm"),
            Err(LeafLesionError::DivisionUndefined(_))
        ));
    }

    #[test]
    fn pixel_and_physical_areas_convert_both_ways() {
        assert_approx_eq!(pixel_area_to_physical(50.0, 10.0).unwrap(), 0.5);
        assert_approx_eq!(physical_area_to_pixels(0.5, 10.0), 50.0);
        assert!(pixel_area_to_physical(50.0, 0.0).is_err());
    }
}
