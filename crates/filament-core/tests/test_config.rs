use filament_core::batch::config::BatchConfig;
use filament_core::batch::BatchStage;
use filament_core::binarize::ThresholdMethod;
use filament_core::consts::{DEFAULT_LAMBDA_MAX, DEFAULT_LAMBDA_MIN, DEFAULT_MIN_FIT_POINTS};
use filament_core::error::ErrorKind;
use filament_core::fit::{FitConfig, FitWindow};
use filament_core::io::crop::CropRegion;

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

#[test]
fn test_fit_window_display() {
    assert_eq!(format!("{}", FitWindow::Full), "Full series");
    assert_eq!(format!("{}", FitWindow::Monotone), "Monotone run");
    let window = FitWindow::Time {
        min_time: Some(0.5),
        max_time: None,
    };
    assert_eq!(format!("{window}"), "Time [0.5, inf) s");
}

#[test]
fn test_threshold_method_display() {
    assert_eq!(format!("{}", ThresholdMethod::Otsu), "Otsu");
    assert_eq!(format!("{}", ThresholdMethod::MeanPlusSigma), "Mean + Sigma");
    assert_eq!(format!("{}", ThresholdMethod::Fixed(0.25)), "Fixed (0.25)");
}

#[test]
fn test_batch_stage_display() {
    assert_eq!(format!("{}", BatchStage::Binarizing), "Measuring frames");
    assert_eq!(format!("{}", BatchStage::Fitting), "Fitting decay");
}

#[test]
fn test_error_kind_names_parse_back() {
    for kind in [
        ErrorKind::EmptySequence,
        ErrorKind::NonConvergentFit,
        ErrorKind::MissingInput,
        ErrorKind::WorkerPanic,
    ] {
        assert_eq!(ErrorKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(ErrorKind::parse("Nope"), None);
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn test_batch_config_defaults() {
    let config = BatchConfig::default();
    assert!(config.skip_existing);
    assert!(config.include_existing);
    assert!(config.save.binary);
    assert!(!config.save.crop);
    assert_eq!(config.workers, 0);
    assert!(config.worker_count() >= 1);
    assert_eq!(config.fit.window, FitWindow::Full);
    assert_eq!(config.crop, CropRegion::default());
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_json_uses_defaults() {
    let config: BatchConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, BatchConfig::default());
}

#[test]
fn test_partial_fit_config_fills_defaults() {
    let fit: FitConfig = serde_json::from_str(r#"{"lambda_max": 2.5}"#).unwrap();
    assert_eq!(fit.lambda_max, 2.5);
    assert_eq!(fit.lambda_min, DEFAULT_LAMBDA_MIN);
    assert_eq!(fit.min_points, DEFAULT_MIN_FIT_POINTS);
    assert_ne!(fit.lambda_max, DEFAULT_LAMBDA_MAX);
}

#[test]
fn test_output_dir_defaults_under_root() {
    let config = BatchConfig::default();
    let root = std::path::Path::new("/data/videos");
    assert_eq!(config.output_dir(root), root.join("analysis"));
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_fields_rejected() {
    assert!(serde_json::from_str::<BatchConfig>(r#"{"wrokers": 4}"#).is_err());
    assert!(serde_json::from_str::<BatchConfig>(r#"{"fit": {"lamda_min": 1.0}}"#).is_err());
}

#[test]
fn test_config_round_trips_through_json() {
    let mut config = BatchConfig::default();
    config.fit.window = FitWindow::Diameter {
        upper: 0.1,
        lower: 0.045,
    };
    config.binarize.threshold_method = ThresholdMethod::Fixed(0.3);
    config.calibration.mm_per_pixel = Some(0.012);
    let json = serde_json::to_string(&config).unwrap();
    let back: BatchConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_inverted_lambda_bounds_invalid() {
    let mut config = BatchConfig::default();
    config.fit.lambda_min = 1.0;
    config.fit.lambda_max = 0.5;
    assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::InvalidConfig);
}

#[test]
fn test_fixed_threshold_out_of_range_invalid() {
    let mut config = BatchConfig::default();
    config.binarize.threshold_method = ThresholdMethod::Fixed(1.5);
    assert!(config.validate().is_err());
}
