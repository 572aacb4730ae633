use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use log::{error, info, warn};
use rayon::prelude::*;

use leaf_lesion_rust_lib::config::Config;
use leaf_lesion_rust_lib::filter_settings::FilterSettings;
use leaf_lesion_rust_lib::image_io::{get_image_files_in_dir, load_image};
use leaf_lesion_rust_lib::output::{write_summary_csv, write_tidy_csv};
use leaf_lesion_rust_lib::pipeline::{process_image, ProcessedImage};

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "LeafLesionR - Lesion coverage on leaf photographs")]
struct Args {
    /// Path to input file or directory
    #[clap(short, long)]
    input: Option<String>,

    /// Path to output directory
    #[clap(short, long)]
    output: Option<String>,

    /// Path to configuration file
    #[clap(short, long)]
    config: Option<String>,

    /// Path to a filter settings TOML file (overwrites config)
    #[clap(short, long)]
    filter_settings: Option<String>,

    /// Side length of the square scale card (overwrites config)
    #[clap(short, long)]
    scale_card_side_length: Option<f64>,

    /// Write the built-in filter settings to this path and exit
    #[clap(long)]
    create_default_filter: Option<String>,

    /// Also write one row per region to tidy_results.csv
    #[clap(short, long)]
    tidy: bool,

    /// Enable debug mode (save intermediate masks)
    #[clap(short, long)]
    debug: bool,
}

fn process_path(path: &Path, config: &Config, settings: &FilterSettings, debug: bool) -> anyhow::Result<ProcessedImage> {
    info!("Processing: {}", path.display());
    let input_image = load_image(path).with_context(|| format!("loading {}", path.display()))?;
    let processed = process_image(input_image, config, settings, debug)
        .with_context(|| format!("analysing {}", path.display()))?;
    Ok(processed)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Some(path) = &args.create_default_filter {
        FilterSettings::default()
            .save_to_file(path)
            .with_context(|| format!("writing default filter settings to {}", path))?;
        info!("Default filter settings written to {}", path);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    // Command-line arguments take precedence over the config file
    if let Some(input) = args.input.clone() {
        config.input_path = input;
    }
    if let Some(output) = args.output.clone() {
        config.output_base_dir = output;
    }
    if let Some(path) = args.filter_settings.clone() {
        config.filter_settings_path = Some(path);
    }
    if let Some(side) = args.scale_card_side_length {
        config.scale_card_side_length = Some(side);
    }
    if args.tidy {
        config.create_tidy_output = true;
    }

    config.validate()?;

    let settings = match &config.filter_settings_path {
        Some(path) => FilterSettings::from_file(path)?,
        None => FilterSettings::default(),
    };

    let start_time = Instant::now();

    let input_path = PathBuf::from(&config.input_path);
    let image_files = if input_path.is_file() {
        vec![input_path]
    } else {
        let files = get_image_files_in_dir(&input_path)?;
        info!("Found {} images in {}", files.len(), input_path.display());
        files
    };

    let results: Vec<(PathBuf, anyhow::Result<ProcessedImage>)> = if config.use_parallel {
        image_files
            .par_iter()
            .map(|path| (path.clone(), process_path(path, &config, &settings, args.debug)))
            .collect()
    } else {
        image_files
            .iter()
            .map(|path| (path.clone(), process_path(path, &config, &settings, args.debug)))
            .collect()
    };

    let mut processed = Vec::new();
    let mut failures = 0;
    for (path, result) in results {
        match result {
            Ok(image) => processed.push(image),
            Err(e) => {
                error!("Skipping {}: {:#}", path.display(), e);
                failures += 1;
            }
        }
    }

    if processed.is_empty() && failures > 0 {
        bail!("all {} images failed", failures);
    }
    if failures > 0 {
        warn!("{} of {} images failed", failures, failures + processed.len());
    }

    let output_base = PathBuf::from(&config.output_base_dir);
    let reports: Vec<_> = processed.iter().map(|p| p.report.clone()).collect();
    write_summary_csv(&reports, output_base.join("summary_results.csv"))?;

    if config.create_tidy_output {
        let rows: Vec<_> = processed.iter().flat_map(|p| p.rows.iter().cloned()).collect();
        write_tidy_csv(&rows, output_base.join("tidy_results.csv"))?;
    }

    info!(
        "Processed {} images in {:.2} seconds",
        processed.len(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}
