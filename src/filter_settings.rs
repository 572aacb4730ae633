use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::errors::{LeafLesionError, Result};
use crate::threshold::ColorBounds;

/// Setting names looked up by the domain pipelines
pub const LEAF_AREA: &str = "leaf_area";
pub const HEALTHY_AREA: &str = "healthy_area";
pub const LESION_AREA: &str = "lesion_area";
pub const INNER_LESION_AREA: &str = "inner_lesion_area";
pub const SCALE_CARD: &str = "scale_card";

// Built-in bounds, expressed on the 0-255 scale where they were tuned
pub const LEAF_AREA_HUE: (f32, f32) = (0.0 / 255.0, 255.0 / 255.0);
pub const LEAF_AREA_SAT: (f32, f32) = (50.0 / 255.0, 255.0 / 255.0);
pub const LEAF_AREA_VAL: (f32, f32) = (40.0 / 255.0, 255.0 / 255.0);

pub const HEALTHY_HUE: (f32, f32) = (40.0 / 255.0, 255.0 / 255.0);
pub const HEALTHY_SAT: (f32, f32) = (50.0 / 255.0, 255.0 / 255.0);
pub const HEALTHY_VAL: (f32, f32) = (0.0 / 255.0, 255.0 / 255.0);

pub const LESION_HUE: (f32, f32) = (0.0 / 255.0, 41.0 / 255.0);
pub const LESION_SAT: (f32, f32) = (38.0 / 255.0, 255.0 / 255.0);
pub const LESION_VAL: (f32, f32) = (111.0 / 255.0, 255.0 / 255.0);

pub const SCALE_CARD_HUE: (f32, f32) = (0.61, 1.0);
pub const SCALE_CARD_SAT: (f32, f32) = (0.17, 1.0);
pub const SCALE_CARD_VAL: (f32, f32) = (0.25, 0.75);

/// Default minimum leaf object area, pixels
pub const DEFAULT_LEAF_MIN_AREA: u64 = 10_000;
/// Default minimum lesion area, pixels
pub const DEFAULT_LESION_MIN_AREA: u64 = 10;

/// HSV bounds plus the scalar thresholds used with them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSetting {
    pub h: (f32, f32),
    pub s: (f32, f32),
    pub v: (f32, f32),

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_area: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_axis_ratio: Option<f64>,

    /// Largest enclosed hole filled in leaf and lesion masks; `None` fills
    /// every hole. Healthy masks are never filled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hole_area: Option<u64>,
}

impl FilterSetting {
    /// A setting with bounds only
    pub fn new(h: (f32, f32), s: (f32, f32), v: (f32, f32)) -> Self {
        Self {
            h,
            s,
            v,
            min_area: None,
            min_axis_ratio: None,
            max_hole_area: None,
        }
    }

    pub fn with_min_area(mut self, min_area: u64) -> Self {
        self.min_area = Some(min_area);
        self
    }

    pub fn with_min_axis_ratio(mut self, ratio: f64) -> Self {
        self.min_axis_ratio = Some(ratio);
        self
    }

    pub fn with_max_hole_area(mut self, area: u64) -> Self {
        self.max_hole_area = Some(area);
        self
    }

    pub fn bounds(&self) -> ColorBounds {
        ColorBounds::new(self.h, self.s, self.v)
    }
}

/// Named table of filter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSettings {
    settings: BTreeMap<String, FilterSetting>,
}

impl Default for FilterSettings {
    /// The built-in settings for leaf, healthy, lesion and scale card regions
    fn default() -> Self {
        let mut settings = Self::empty();
        settings.add_setting(
            LEAF_AREA,
            FilterSetting::new(LEAF_AREA_HUE, LEAF_AREA_SAT, LEAF_AREA_VAL)
                .with_min_area(DEFAULT_LEAF_MIN_AREA),
        );
        settings.add_setting(
            HEALTHY_AREA,
            FilterSetting::new(HEALTHY_HUE, HEALTHY_SAT, HEALTHY_VAL).with_min_area(1),
        );
        settings.add_setting(
            LESION_AREA,
            FilterSetting::new(LESION_HUE, LESION_SAT, LESION_VAL)
                .with_min_area(DEFAULT_LESION_MIN_AREA),
        );
        settings.add_setting(
            SCALE_CARD,
            FilterSetting::new(SCALE_CARD_HUE, SCALE_CARD_SAT, SCALE_CARD_VAL),
        );
        settings
    }
}

impl FilterSettings {
    /// A table with no settings
    pub fn empty() -> Self {
        Self { settings: BTreeMap::new() }
    }

    /// Insert or replace a named setting
    pub fn add_setting(&mut self, name: &str, setting: FilterSetting) {
        self.settings.insert(name.to_string(), setting);
    }

    /// Look up a setting by name
    pub fn get(&self, name: &str) -> Result<&FilterSetting> {
        self.settings
            .get(name)
            .ok_or_else(|| LeafLesionError::SettingNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.settings.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.settings.keys().map(String::as_str)
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LeafLesionError::Config(format!("Failed to read filter settings '{}': {}", path.display(), e))
        })?;

        let settings: FilterSettings = toml::from_str(&content).map_err(|e| LeafLesionError::ConfigLoad {
            source: e,
            path: path.to_path_buf(),
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            LeafLesionError::Config(format!("Failed to serialize filter settings: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }

    /// Validate every setting's bounds and thresholds
    pub fn validate(&self) -> Result<()> {
        for (name, setting) in &self.settings {
            setting.bounds().validate().map_err(|e| {
                LeafLesionError::Config(format!("filter setting '{}': {}", name, e))
            })?;

            if let Some(ratio) = setting.min_axis_ratio {
                if ratio.is_nan() || ratio < 0.0 {
                    return Err(LeafLesionError::Config(format!(
                        "filter setting '{}': min_axis_ratio must be >= 0.0", name
                    )));
                }
            }
        }
        Ok(())
    }
}
