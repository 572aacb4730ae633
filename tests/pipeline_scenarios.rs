use std::fs;

use assert_approx_eq::assert_approx_eq;
use image::{DynamicImage, Rgb, RgbImage};

use leaf_lesion_rust_lib::filter_settings::{
    FilterSetting, FilterSettings, HEALTHY_AREA, INNER_LESION_AREA, LEAF_AREA, LESION_AREA, SCALE_CARD,
};
use leaf_lesion_rust_lib::image_io::InputImage;
use leaf_lesion_rust_lib::output::region_rows;
use leaf_lesion_rust_lib::{analyze, process_image, Config, LeafLesionError, ScaleCardSpec};

const WHITE: [u8; 3] = [255, 255, 255];
const GREEN: [u8; 3] = [40, 160, 40];
const BROWN: [u8; 3] = [200, 100, 20];
const DARK_BROWN: [u8; 3] = [100, 50, 10];
const BLUE: [u8; 3] = [40, 40, 160];

fn fill(image: &mut RgbImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>, color: [u8; 3]) {
    for y in ys {
        for x in xs.clone() {
            image.put_pixel(x, y, Rgb(color));
        }
    }
}

/// 40x30 photograph: a 20x15 leaf with a 4x4 and a 3x3 lesion, and a 6x6 card
fn synthetic_photo() -> RgbImage {
    let mut image = RgbImage::from_pixel(40, 30, Rgb(WHITE));
    fill(&mut image, 5..25, 5..20, GREEN);
    fill(&mut image, 8..12, 8..12, BROWN);
    fill(&mut image, 18..21, 14..17, BROWN);
    fill(&mut image, 30..36, 20..26, BLUE);
    image
}

fn settings() -> FilterSettings {
    let mut settings = FilterSettings::empty();
    settings.add_setting(
        LEAF_AREA,
        FilterSetting::new((0.0, 0.5), (0.3, 1.0), (0.1, 1.0)).with_min_area(20),
    );
    settings.add_setting(
        HEALTHY_AREA,
        FilterSetting::new((0.2, 0.5), (0.3, 1.0), (0.0, 1.0)).with_min_area(1),
    );
    settings.add_setting(
        LESION_AREA,
        FilterSetting::new((0.0, 0.15), (0.3, 1.0), (0.1, 1.0)).with_min_area(3),
    );
    settings.add_setting(
        SCALE_CARD,
        FilterSetting::new((0.6, 0.7), (0.3, 1.0), (0.3, 0.7)),
    );
    settings
}

#[test]
fn coverage_of_synthetic_leaf() {
    let image = DynamicImage::ImageRgb8(synthetic_photo());
    let output = analyze("synthetic", &image, &settings(), None).unwrap();
    let report = &output.report;

    assert_eq!(report.leaf_area, 300);
    assert_eq!(report.healthy_area, 275);
    assert_eq!(report.healthy_region_count, 1);
    assert_eq!(report.lesion_count, 2);
    assert_eq!(report.lesion_area, 25);
    assert_approx_eq!(report.lesion_coverage.unwrap(), 25.0 / 300.0);
    assert_eq!(report.lesion_centres, vec![(9.5, 9.5), (15.0, 19.0)]);
    assert!(report.calibration.is_none());
    assert!(output.inner_lesions.is_none());
}

#[test]
fn scale_card_calibrates_areas() {
    let image = DynamicImage::ImageRgb8(synthetic_photo());
    let spec = ScaleCardSpec {
        side_length: 3.0,
        unit: "cm".to_string(),
    };
    let output = analyze("synthetic", &image, &settings(), Some(&spec)).unwrap();
    let calibration = output.calibration.as_ref().unwrap();

    assert_eq!(calibration.card_area_pixels, 36);
    assert_approx_eq!(calibration.pixels_per_unit, 2.0);
    assert_approx_eq!(output.report.leaf_area_physical().unwrap(), 75.0);
    assert_approx_eq!(output.report.lesion_area_physical().unwrap(), 6.25);
}

#[test]
fn missing_scale_card_fails_when_requested() {
    let mut photo = synthetic_photo();
    fill(&mut photo, 30..36, 20..26, WHITE);
    let spec = ScaleCardSpec {
        side_length: 3.0,
        unit: "cm".to_string(),
    };
    let result = analyze("no_card", &DynamicImage::ImageRgb8(photo), &settings(), Some(&spec));
    assert!(matches!(result, Err(LeafLesionError::EmptyMask(_))));
}

#[test]
fn inner_lesions_are_matched_to_their_halo() {
    let mut photo = synthetic_photo();
    fill(&mut photo, 9..11, 9..11, DARK_BROWN);
    let mut settings = settings();
    settings.add_setting(
        INNER_LESION_AREA,
        FilterSetting::new((0.0, 0.15), (0.3, 1.0), (0.1, 0.5)).with_min_area(3),
    );

    let output = analyze("inner", &DynamicImage::ImageRgb8(photo), &settings, None).unwrap();

    assert_eq!(output.report.lesion_area, 25);
    assert_eq!(output.report.inner_lesion_count, Some(1));
    assert_eq!(output.report.inner_lesion_area, Some(4));
    assert_eq!(output.lesion_matches.len(), 1);
    assert_eq!(output.lesion_matches[0].outer_label, output.lesions.regions[0].label);
    assert_approx_eq!(output.lesion_matches[0].distance, 0.0);

    let rows = region_rows(&output);
    let row = |area_type: &str, label: u32| {
        rows.iter()
            .find(|r| r.area_type == area_type && r.label == label)
            .unwrap()
            .clone()
    };
    assert_eq!(row("inner_lesion", 1).matched_with, Some(1));
    assert_eq!(row("lesion", 1).matched_with, Some(1));
    assert_eq!(row("lesion", 2).matched_with, None);
    assert_eq!(row("leaf", 1).matched_with, None);
}

#[test]
fn blank_photo_has_undefined_coverage() {
    let photo = RgbImage::from_pixel(10, 10, Rgb(WHITE));
    let output = analyze("blank", &DynamicImage::ImageRgb8(photo), &settings(), None).unwrap();
    assert_eq!(output.report.leaf_area, 0);
    assert!(output.report.lesion_coverage.is_none());
}

#[test]
fn rgba_input_is_rejected() {
    let photo = DynamicImage::ImageRgba8(image::RgbaImage::new(4, 4));
    assert!(matches!(
        analyze("rgba", &photo, &settings(), None),
        Err(LeafLesionError::InvalidShape(_))
    ));
}

#[test]
fn process_image_writes_artefacts() {
    let out_dir = std::env::temp_dir().join("leaf_lesion_process_image");
    let config = Config {
        input_path: out_dir.display().to_string(),
        output_base_dir: out_dir.display().to_string(),
        scale_card_side_length: Some(3.0),
        write_sub_images: true,
        ..Config::default()
    };
    let input = InputImage {
        image: DynamicImage::ImageRgb8(synthetic_photo()),
        path: out_dir.join("leaf_01.png"),
        filename: "leaf_01".to_string(),
    };

    let processed = process_image(input, &config, &settings(), true).unwrap();

    assert_eq!(processed.report.lesion_count, 2);
    // leaf, healthy, two lesions and the card
    assert_eq!(processed.rows.len(), 5);
    assert!(processed.rows.iter().all(|row| row.physical_area.is_some()));

    let overlay = image::open(out_dir.join("overlays").join("leaf_01_annotated.png")).unwrap();
    assert_eq!((overlay.width(), overlay.height()), (40, 30));

    let leaf = image::open(out_dir.join("sub_images").join("leaf_01_leaf.png")).unwrap();
    assert_eq!((leaf.width(), leaf.height()), (20, 15));

    assert!(out_dir.join("debug").join("leaf_01_lesion_mask.png").is_file());
    fs::remove_dir_all(out_dir.join("debug")).unwrap();
}
