use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{LeafLesionError, Result};

/// Configuration for LeafLesionR
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub input_path: String,
    pub output_base_dir: String,

    /// TOML filter settings; the built-in settings are used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_settings_path: Option<String>,

    /// Known side length of the square scale card; enables calibration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_card_side_length: Option<f64>,

    #[serde(default = "default_scale_unit")]
    pub scale_unit: String,

    #[serde(default = "default_parallel")]
    pub use_parallel: bool,

    // Output switches
    #[serde(default = "default_write_overlays")]
    pub write_overlays: bool,

    #[serde(default = "default_write_sub_images")]
    pub write_sub_images: bool,

    #[serde(default = "default_create_tidy_output")]
    pub create_tidy_output: bool,

    #[serde(default = "default_overlay_healthy_color_rgb")]
    pub overlay_healthy_color_rgb: [u8; 3],

    #[serde(default = "default_overlay_lesion_color_rgb")]
    pub overlay_lesion_color_rgb: [u8; 3],

    #[serde(default = "default_overlay_scale_card_color_rgb")]
    pub overlay_scale_card_color_rgb: [u8; 3],
}

fn default_scale_unit() -> String {
    "cm".to_string()
}

fn default_parallel() -> bool {
    true
}

fn default_write_overlays() -> bool {
    true
}

fn default_write_sub_images() -> bool {
    false
}

fn default_create_tidy_output() -> bool {
    false
}

fn default_overlay_healthy_color_rgb() -> [u8; 3] {
    [127, 191, 63] // Leaf green
}

fn default_overlay_lesion_color_rgb() -> [u8; 3] {
    [243, 80, 21] // Orange
}

fn default_overlay_scale_card_color_rgb() -> [u8; 3] {
    [63, 127, 255]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: "./input".to_string(),
            output_base_dir: "./output".to_string(),
            filter_settings_path: None,
            scale_card_side_length: None,
            scale_unit: default_scale_unit(),
            use_parallel: true,
            write_overlays: true,
            write_sub_images: false,
            create_tidy_output: false,
            overlay_healthy_color_rgb: default_overlay_healthy_color_rgb(),
            overlay_lesion_color_rgb: default_overlay_lesion_color_rgb(),
            overlay_scale_card_color_rgb: default_overlay_scale_card_color_rgb(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LeafLesionError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| LeafLesionError::ConfigLoad {
            source: e,
            path: path.to_path_buf(),
        })?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Check input path exists
        let input_path = PathBuf::from(&self.input_path);
        if !input_path.exists() {
            return Err(LeafLesionError::InvalidPath(input_path));
        }

        if let Some(path) = &self.filter_settings_path {
            let path = PathBuf::from(path);
            if !path.is_file() {
                return Err(LeafLesionError::InvalidPath(path));
            }
        }

        if let Some(side) = self.scale_card_side_length {
            if !(side > 0.0) || !side.is_finite() {
                return Err(LeafLesionError::Config(
                    "scale_card_side_length must be a finite value > 0.0".to_string(),
                ));
            }
        }

        if self.scale_unit.trim().is_empty() {
            return Err(LeafLesionError::Config(
                "scale_unit must not be empty".to_string(),
            ));
        }

        // Create output directory if it doesn't exist
        fs::create_dir_all(&self.output_base_dir)?;

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            LeafLesionError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }
}
