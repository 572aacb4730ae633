use image::{DynamicImage, ImageBuffer, Rgb, Rgb32FImage, RgbImage};

use crate::errors::{LeafLesionError, Result};

/// HSV image with every channel normalized to [0, 1]
pub type HsvImage = Rgb32FImage;

/// Convert a decoded image to HSV.
///
/// 8-bit, 16-bit and float RGB inputs are accepted. Anything that does not
/// carry exactly three channels (grayscale, RGBA, ...) is rejected.
pub fn to_hsv(image: &DynamicImage) -> Result<HsvImage> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(LeafLesionError::InvalidShape(format!(
            "image has zero extent ({}x{})", width, height
        )));
    }

    match image {
        DynamicImage::ImageRgb8(img) => Ok(rgb_to_hsv(img)),
        DynamicImage::ImageRgb16(img) => Ok(ImageBuffer::from_fn(width, height, |x, y| {
            let p = img.get_pixel(x, y);
            Rgb(rgb_pixel_to_hsv(
                p[0] as f32 / 65535.0,
                p[1] as f32 / 65535.0,
                p[2] as f32 / 65535.0,
            ))
        })),
        DynamicImage::ImageRgb32F(img) => Ok(ImageBuffer::from_fn(width, height, |x, y| {
            let p = img.get_pixel(x, y);
            Rgb(rgb_pixel_to_hsv(
                p[0].clamp(0.0, 1.0),
                p[1].clamp(0.0, 1.0),
                p[2].clamp(0.0, 1.0),
            ))
        })),
        other => Err(LeafLesionError::InvalidShape(format!(
            "expected 3 colour channels, found {}",
            other.color().channel_count()
        ))),
    }
}

/// Convert an 8-bit RGB image to HSV
pub fn rgb_to_hsv(image: &RgbImage) -> HsvImage {
    let (width, height) = image.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| {
        let p = image.get_pixel(x, y);
        Rgb(rgb_pixel_to_hsv(
            p[0] as f32 / 255.0,
            p[1] as f32 / 255.0,
            p[2] as f32 / 255.0,
        ))
    })
}

/// Convert an HSV image back to 8-bit RGB, rounding to the nearest value
pub fn to_rgb255(hsv: &HsvImage) -> RgbImage {
    let (width, height) = hsv.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| {
        let p = hsv.get_pixel(x, y);
        let [r, g, b] = hsv_pixel_to_rgb(p[0], p[1], p[2]);
        Rgb([to_u8(r), to_u8(g), to_u8(b)])
    })
}

#[inline]
fn to_u8(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Standard RGB -> HSV transform for a single pixel with channels in [0, 1]
pub fn rgb_pixel_to_hsv(r: f32, g: f32, b: f32) -> [f32; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let value = max;
    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    let hue = if delta == 0.0 {
        0.0
    } else {
        let sextant = if r == max {
            (g - b) / delta
        } else if g == max {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };
        let h = (sextant / 6.0).rem_euclid(1.0);
        // rem_euclid can land on 1.0 for tiny negative inputs
        if h >= 1.0 { 0.0 } else { h }
    };

    [hue, saturation, value]
}

/// HSV -> RGB for a single pixel, all channels in [0, 1]
pub fn hsv_pixel_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    if s == 0.0 {
        return [v, v, v];
    }

    let h6 = h.rem_euclid(1.0) * 6.0;
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);

    match sector as u32 % 6 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}
