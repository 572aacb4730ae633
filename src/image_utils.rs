use image::{GenericImageView, GrayImage, ImageBuffer, Luma, Pixel, Rgb};

use crate::color_space::HsvImage;
use crate::errors::{LeafLesionError, Result};
use crate::labelling::LabelMap;
use crate::region_properties::BoundingBox;

/// Constants
pub const FOREGROUND: u8 = 255; // Mask value for selected pixels
pub const BACKGROUND: u8 = 0;

/// Check if a mask pixel is selected
#[inline]
pub fn is_foreground(pixel: &Luma<u8>) -> bool {
    pixel[0] != BACKGROUND
}

/// Number of selected pixels in a mask
pub fn mask_area(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| is_foreground(p)).count() as u64
}

/// Pixel-wise AND of two masks of the same extent
pub fn mask_and(a: &GrayImage, b: &GrayImage) -> Result<GrayImage> {
    if a.dimensions() != b.dimensions() {
        return Err(LeafLesionError::InvalidShape(format!(
            "cannot intersect masks of {:?} and {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }

    let (width, height) = a.dimensions();
    Ok(ImageBuffer::from_fn(width, height, |x, y| {
        if is_foreground(a.get_pixel(x, y)) && is_foreground(b.get_pixel(x, y)) {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    }))
}

/// Mask of every labelled (non-zero) pixel
pub fn label_map_to_mask(labels: &LabelMap) -> GrayImage {
    let (width, height) = labels.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| {
        if labels.get_pixel(x, y)[0] > 0 {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Zero every HSV pixel outside the mask
pub fn clear_background(hsv: &HsvImage, mask: &GrayImage) -> Result<HsvImage> {
    if hsv.dimensions() != mask.dimensions() {
        return Err(LeafLesionError::InvalidShape(format!(
            "mask {:?} does not match image {:?}",
            mask.dimensions(),
            hsv.dimensions()
        )));
    }

    let mut cleared = hsv.clone();
    for (x, y, pixel) in cleared.enumerate_pixels_mut() {
        if !is_foreground(mask.get_pixel(x, y)) {
            *pixel = Rgb([0.0, 0.0, 0.0]);
        }
    }
    Ok(cleared)
}

/// Crop an image to a region's bounding box
pub fn extract_segment<I>(image: &I, bbox: &BoundingBox) -> ImageBuffer<I::Pixel, Vec<<I::Pixel as Pixel>::Subpixel>>
where
    I: GenericImageView,
{
    let (width, height) = image.dimensions();
    let min_x = bbox.min_col.min(width);
    let min_y = bbox.min_row.min(height);
    let max_x = bbox.max_col.min(width).max(min_x);
    let max_y = bbox.max_row.min(height).max(min_y);

    ImageBuffer::from_fn(max_x - min_x, max_y - min_y, |x, y| {
        image.get_pixel(min_x + x, min_y + y)
    })
}

/// Build a mask from text rows, `#` marking foreground
#[cfg(test)]
pub(crate) fn mask_from_rows(rows: &[&str]) -> GrayImage {
    let height = rows.len() as u32;
    let width = rows[0].len() as u32;
    ImageBuffer::from_fn(width, height, |x, y| {
        if rows[y as usize].as_bytes()[x as usize] == b'#' {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}
