use image::{GrayImage, ImageBuffer, Luma};
use serde::{Deserialize, Serialize};

use crate::color_space::HsvImage;
use crate::errors::{LeafLesionError, Result};
use crate::image_utils::{FOREGROUND, BACKGROUND};

/// Binary mask: 255 for selected pixels, 0 for the rest
pub type BinaryMask = GrayImage;

/// Closed lower/upper bounds for each HSV channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorBounds {
    pub h: (f32, f32),
    pub s: (f32, f32),
    pub v: (f32, f32),
}

impl ColorBounds {
    pub fn new(h: (f32, f32), s: (f32, f32), v: (f32, f32)) -> Self {
        Self { h, s, v }
    }

    /// Bounds that select every pixel
    pub fn everything() -> Self {
        Self::new((0.0, 1.0), (0.0, 1.0), (0.0, 1.0))
    }

    /// Check lower <= upper and that every bound lies in [0, 1]
    pub fn validate(&self) -> Result<()> {
        for (name, (lower, upper)) in [("h", self.h), ("s", self.s), ("v", self.v)] {
            if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) {
                return Err(LeafLesionError::Config(format!(
                    "{} bounds ({}, {}) must lie within [0, 1]", name, lower, upper
                )));
            }
            if lower > upper {
                return Err(LeafLesionError::Config(format!(
                    "{} lower bound {} exceeds upper bound {}", name, lower, upper
                )));
            }
        }
        Ok(())
    }

    /// True iff every channel falls inside its closed interval
    #[inline]
    pub fn contains(&self, hsv: &[f32; 3]) -> bool {
        within(hsv[0], self.h) && within(hsv[1], self.s) && within(hsv[2], self.v)
    }
}

#[inline]
fn within(value: f32, (lower, upper): (f32, f32)) -> bool {
    value >= lower && value <= upper
}

/// Mark every pixel whose H, S and V all lie within `bounds`
pub fn threshold(hsv: &HsvImage, bounds: &ColorBounds) -> BinaryMask {
    let (width, height) = hsv.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| {
        if bounds.contains(&hsv.get_pixel(x, y).0) {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}
