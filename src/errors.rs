use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Custom error types for LeafLesionR
#[derive(Error, Debug)]
pub enum LeafLesionError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid image shape: {0}")]
    InvalidShape(String),

    #[error("Mask contains no foreground pixels: {0}")]
    EmptyMask(String),

    #[error("Filter setting not found: {0}")]
    SettingNotFound(String),

    #[error("Division undefined: {0}")]
    DivisionUndefined(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration from {path}: {source}")]
    ConfigLoad {
        source: toml::de::Error,
        path: PathBuf,
    },

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("Invalid input path: {0}")]
    InvalidPath(PathBuf),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, LeafLesionError>;
