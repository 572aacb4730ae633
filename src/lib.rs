// src/lib.rs - Library interface for LeafLesionR

pub mod calibration;
pub mod color_space;
pub mod config;
pub mod errors;
pub mod filter_settings;
pub mod image_io;
pub mod image_utils;
pub mod labelling;
pub mod matching;
pub mod morphology;
pub mod output;
pub mod overlay;
pub mod pipeline;
pub mod region_filter;
pub mod region_properties;
pub mod regions;
pub mod report;
pub mod threshold;

// Re-export commonly used types and functions
pub use errors::{LeafLesionError, Result};
pub use config::Config;
pub use filter_settings::{FilterSetting, FilterSettings};
pub use image_io::{InputImage, load_image, save_image};
pub use pipeline::{analyze, process_image, PipelineOutput, ScaleCardSpec};
pub use report::Report;

pub use color_space::{to_hsv, to_rgb255, HsvImage};
pub use threshold::{threshold, BinaryMask, ColorBounds};
pub use morphology::{clean, fill_holes, remove_small_objects};
pub use labelling::{label, LabelMap};
pub use region_properties::{extract_properties, BoundingBox, RegionProperties};
pub use region_filter::{filter_regions, is_long_and_large, is_not_small, RegionPredicate};
