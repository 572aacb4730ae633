use std::fs;
use std::path::Path;
use csv::Writer;

use crate::errors::{LeafLesionError, Result};
use crate::matching::LesionMatch;
use crate::pipeline::PipelineOutput;
use crate::report::Report;

const MISSING: &str = "NA";

/// One retained region in the tidy per-region table
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRow {
    pub image: String,
    pub area_type: String,
    pub label: u32,
    pub area: u64,
    /// Bounding-box centre (row, col)
    pub centre: (f64, f64),
    pub axis_ratio: f64,
    pub physical_area: Option<f64>,
    /// Label of the paired region in the other lesion class
    pub matched_with: Option<u32>,
}

/// Label paired with `label` by inner/outer lesion matching
fn matched_label(matches: &[LesionMatch], area_type: &str, label: u32) -> Option<u32> {
    match area_type {
        "lesion" => matches.iter().find(|m| m.outer_label == label).map(|m| m.inner_label),
        "inner_lesion" => matches.iter().find(|m| m.inner_label == label).map(|m| m.outer_label),
        _ => None,
    }
}

/// Per-region rows for every region class of a processed image
pub fn region_rows(output: &PipelineOutput) -> Vec<RegionRow> {
    let image = &output.report.image_name;
    let mut classes = vec![
        ("leaf", &output.leaf),
        ("healthy", &output.healthy),
        ("lesion", &output.lesions),
    ];
    if let Some(inner) = &output.inner_lesions {
        classes.push(("inner_lesion", inner));
    }
    if let Some(card) = &output.scale_card {
        classes.push(("scale_card", card));
    }

    classes
        .into_iter()
        .flat_map(|(area_type, set)| {
            set.regions.iter().map(move |region| RegionRow {
                image: image.clone(),
                area_type: area_type.to_string(),
                label: region.label,
                area: region.area,
                centre: region.bbox.centre(),
                axis_ratio: region.axis_ratio,
                physical_area: output
                    .calibration
                    .as_ref()
                    .map(|c| c.to_physical_area(region.area)),
                matched_with: matched_label(&output.lesion_matches, area_type, region.label),
            })
        })
        .collect()
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| MISSING.to_string())
}

fn optional_f64(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_else(|| MISSING.to_string())
}

fn create_writer(path: &Path) -> Result<Writer<fs::File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Writer::from_path(path).map_err(LeafLesionError::CsvOutput)
}

/// Write one summary row per image
pub fn write_summary_csv<P: AsRef<Path>>(reports: &[Report], path: P) -> Result<()> {
    let mut writer = create_writer(path.as_ref())?;

    writer.write_record(&[
        "Image",
        "Leaf_Area",
        "Healthy_Area",
        "Healthy_Region_Count",
        "Lesion_Count",
        "Lesion_Area",
        "Lesion_Coverage",
        "Lesion_Centres",
        "Inner_Lesion_Count",
        "Inner_Lesion_Area",
        "Matched_Lesion_Count",
        "Unit",
        "Pixels_Per_Unit",
        "Leaf_Area_Physical",
        "Healthy_Area_Physical",
        "Lesion_Area_Physical",
    ])?;

    for report in reports {
        let centres = report
            .lesion_centres
            .iter()
            .map(|(row, col)| format!("{:.1}:{:.1}", row, col))
            .collect::<Vec<_>>()
            .join(";");

        writer.write_record(&[
            report.image_name.clone(),
            report.leaf_area.to_string(),
            report.healthy_area.to_string(),
            report.healthy_region_count.to_string(),
            report.lesion_count.to_string(),
            report.lesion_area.to_string(),
            optional_f64(report.lesion_coverage),
            centres,
            optional(report.inner_lesion_count),
            optional(report.inner_lesion_area),
            optional(report.matched_lesion_count),
            optional(report.calibration.as_ref().map(|c| c.unit.clone())),
            optional_f64(report.calibration.as_ref().map(|c| c.pixels_per_unit)),
            optional_f64(report.leaf_area_physical()),
            optional_f64(report.healthy_area_physical()),
            optional_f64(report.lesion_area_physical()),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write one row per retained region
pub fn write_tidy_csv<P: AsRef<Path>>(rows: &[RegionRow], path: P) -> Result<()> {
    let mut writer = create_writer(path.as_ref())?;

    writer.write_record(&[
        "Image",
        "Area_Type",
        "Label",
        "Area",
        "Centre_Row",
        "Centre_Col",
        "Axis_Ratio",
        "Physical_Area",
        "Matched_With",
    ])?;

    for row in rows {
        writer.write_record(&[
            row.image.clone(),
            row.area_type.clone(),
            row.label.to_string(),
            row.area.to_string(),
            format!("{:.1}", row.centre.0),
            format!("{:.1}", row.centre.1),
            format!("{:.6}", row.axis_ratio),
            optional_f64(row.physical_area),
            optional(row.matched_with),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
