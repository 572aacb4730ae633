use std::fs;
use std::path::PathBuf;

use image::DynamicImage;
use log::{debug, info};

use crate::calibration::Calibration;
use crate::color_space::{to_hsv, to_rgb255, HsvImage};
use crate::config::Config;
use crate::errors::Result;
use crate::filter_settings::{FilterSettings, INNER_LESION_AREA, LESION_AREA};
use crate::image_io::{save_image, save_mask, InputImage};
use crate::image_utils::{clear_background, extract_segment};
use crate::matching::{match_reciprocal_nearest, LesionMatch};
use crate::output::{region_rows, RegionRow};
use crate::overlay::{render_overlay, OverlayColors};
use crate::regions::{healthy_regions, leaf_regions, lesion_regions, scale_card_region, RegionSet};
use crate::report::{build_report, InnerLesions, Report};

/// Known size of the square scale card in the photograph
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleCardSpec {
    pub side_length: f64,
    pub unit: String,
}

/// Everything computed for one image
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub hsv: HsvImage,
    pub leaf: RegionSet,
    pub healthy: RegionSet,
    pub lesions: RegionSet,
    pub inner_lesions: Option<RegionSet>,
    pub lesion_matches: Vec<LesionMatch>,
    pub scale_card: Option<RegionSet>,
    pub calibration: Option<Calibration>,
    pub report: Report,
}

/// Report and per-region rows of a processed image
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub report: Report,
    pub rows: Vec<RegionRow>,
}

/// Run the leaf, healthy, lesion and (optionally) scale card pipelines on one image.
///
/// The inner lesion class runs only when `settings` define it. Passing a
/// `ScaleCardSpec` makes the card mandatory: an image without one is an error.
pub fn analyze(
    image_name: &str,
    image: &DynamicImage,
    settings: &FilterSettings,
    scale_card: Option<&ScaleCardSpec>,
) -> Result<PipelineOutput> {
    let hsv = to_hsv(image)?;

    let leaf = leaf_regions(&hsv, settings)?;
    let healthy = healthy_regions(&hsv, settings, &leaf)?;
    let lesions = lesion_regions(&hsv, settings, &leaf, LESION_AREA)?;

    let inner_lesions = if settings.contains(INNER_LESION_AREA) {
        Some(lesion_regions(&hsv, settings, &leaf, INNER_LESION_AREA)?)
    } else {
        None
    };
    let lesion_matches = match &inner_lesions {
        Some(inner) => match_reciprocal_nearest(&inner.regions, &lesions.regions),
        None => Vec::new(),
    };

    let (card, calibration) = match scale_card {
        Some(spec) => {
            let card = scale_card_region(&hsv, settings, true)?;
            let calibration = Calibration::from_card_area(card.total_area(), spec.side_length, &spec.unit)?;
            debug!(
                "{}: {:.3} pixels per {}",
                image_name, calibration.pixels_per_unit, calibration.unit
            );
            (Some(card), Some(calibration))
        }
        None => (None, None),
    };

    let report = build_report(
        image_name,
        &leaf.regions,
        &healthy.regions,
        &lesions.regions,
        inner_lesions.as_ref().map(|inner| InnerLesions {
            regions: &inner.regions,
            matches: &lesion_matches,
        }),
        calibration.as_ref(),
    );

    Ok(PipelineOutput {
        hsv,
        leaf,
        healthy,
        lesions,
        inner_lesions,
        lesion_matches,
        scale_card: card,
        calibration,
        report,
    })
}

/// Analyse one loaded image and write its per-image artefacts
pub fn process_image(
    input_image: InputImage,
    config: &Config,
    settings: &FilterSettings,
    debug: bool,
) -> Result<ProcessedImage> {
    let InputImage { image, path, filename } = input_image;

    let scale_card = config.scale_card_side_length.map(|side_length| ScaleCardSpec {
        side_length,
        unit: config.scale_unit.clone(),
    });

    let output = analyze(&filename, &image, settings, scale_card.as_ref())?;
    info!(
        "{}: lesion coverage {}",
        path.display(),
        output
            .report
            .lesion_coverage
            .map(|c| format!("{:.4}", c))
            .unwrap_or_else(|| "undefined".to_string())
    );

    let output_base = PathBuf::from(&config.output_base_dir);

    if config.write_overlays {
        let overlay_dir = output_base.join("overlays");
        fs::create_dir_all(&overlay_dir)?;

        let colors = OverlayColors {
            healthy: config.overlay_healthy_color_rgb,
            lesion: config.overlay_lesion_color_rgb,
            scale_card: config.overlay_scale_card_color_rgb,
        };
        let overlay = render_overlay(
            &image.to_rgb8(),
            &output.healthy,
            &output.lesions,
            output.scale_card.as_ref(),
            &colors,
        );
        save_image(&overlay, overlay_dir.join(format!("{}_annotated.png", filename)))?;
    }

    if config.write_sub_images {
        if let Some(leaf) = output.leaf.regions.first() {
            let sub_image_dir = output_base.join("sub_images");
            fs::create_dir_all(&sub_image_dir)?;

            let cleared = clear_background(&output.hsv, &output.leaf.region_mask())?;
            let segment = extract_segment(&cleared, &leaf.bbox);
            save_image(&to_rgb255(&segment), sub_image_dir.join(format!("{}_leaf.png", filename)))?;
        }
    }

    if debug {
        let debug_dir = output_base.join("debug");
        fs::create_dir_all(&debug_dir)?;

        save_mask(&output.leaf.mask, debug_dir.join(format!("{}_leaf_mask.png", filename)))?;
        save_mask(&output.healthy.mask, debug_dir.join(format!("{}_healthy_mask.png", filename)))?;
        save_mask(&output.lesions.mask, debug_dir.join(format!("{}_lesion_mask.png", filename)))?;
        if let Some(card) = &output.scale_card {
            save_mask(&card.mask, debug_dir.join(format!("{}_scale_card_mask.png", filename)))?;
        }
    }

    let rows = region_rows(&output);
    Ok(ProcessedImage {
        report: output.report,
        rows,
    })
}
