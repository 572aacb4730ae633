use std::path::{Path, PathBuf};
use std::fs;
use image::{DynamicImage, GrayImage, RgbImage};

use crate::errors::{LeafLesionError, Result};

/// File extensions treated as leaf photographs
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "tif", "tiff"];

/// Represents an input image with its metadata
pub struct InputImage {
    /// Three-channel image (alpha and grayscale inputs are converted on load)
    pub image: DynamicImage,
    pub path: PathBuf,
    pub filename: String,
}

/// Get all image files from a directory (recursively), sorted by path
pub fn get_image_files_in_dir<P: AsRef<Path>>(dir_path: P) -> Result<Vec<PathBuf>> {
    let dir_path = dir_path.as_ref();

    if !dir_path.exists() {
        return Err(LeafLesionError::InvalidPath(dir_path.to_path_buf()));
    }

    if !dir_path.is_dir() {
        return Err(LeafLesionError::Config(format!(
            "{} is not a directory", dir_path.display()
        )));
    }

    let mut image_files = Vec::new();
    find_image_files_recursive(dir_path, &mut image_files)?;
    image_files.sort();

    Ok(image_files)
}

/// Helper function to recursively search for image files
fn find_image_files_recursive(dir_path: &Path, result: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir_path)? {
        let path = entry?.path();

        if path.is_dir() {
            find_image_files_recursive(&path, result)?;
        } else if path.is_file() && is_image_file(&path) {
            result.push(path);
        }
    }

    Ok(())
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Load an image as three-channel RGB
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<InputImage> {
    let path = path.as_ref();

    // Get filename without extension
    let filename = path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| LeafLesionError::InvalidPath(path.to_path_buf()))?
        .to_string();

    let img = image::open(path)?;

    Ok(InputImage {
        image: to_three_channels(img),
        path: path.to_path_buf(),
        filename,
    })
}

/// Drop alpha and expand grayscale so the colour converter sees RGB
fn to_three_channels(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_) => img,
        DynamicImage::ImageRgba16(_) | DynamicImage::ImageLumaA16(_) | DynamicImage::ImageLuma16(_) => {
            DynamicImage::ImageRgb16(img.to_rgb16())
        }
        DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgb32F(img.to_rgb32f()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Save an RGB image; the format follows the file extension
pub fn save_image<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    image.save(path)?;
    Ok(())
}

/// Save a mask as an 8-bit grayscale image
pub fn save_mask<P: AsRef<Path>>(mask: &GrayImage, path: P) -> Result<()> {
    mask.save(path)?;
    Ok(())
}
