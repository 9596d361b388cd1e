#[allow(dead_code)]
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use filament_core::batch::config::BatchConfig;
use filament_core::batch::{
    run_batch, ArtifactPaths, BatchStage, NoOpReporter, ProgressReporter, RowStatus,
};
use filament_core::error::ErrorKind;
use filament_core::io::table::{read_params_csv, read_series_csv};
use tempfile::TempDir;

/// Counts how often frames were actually processed.
#[derive(Default)]
struct SpyReporter {
    binarize_stages: AtomicUsize,
    skipped: AtomicUsize,
    finished: AtomicUsize,
}

impl ProgressReporter for SpyReporter {
    fn begin_stage(&self, _name: &str, stage: BatchStage, _total: Option<usize>) {
        if stage == BatchStage::Binarizing {
            self.binarize_stages.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn finish_pair(&self, _name: &str, _status: RowStatus) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn pair_skipped(&self, _name: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }
}

fn test_config(output: &TempDir) -> BatchConfig {
    let mut config = BatchConfig::default();
    config.output = Some(output.path().to_path_buf());
    config.calibration.mm_per_pixel = Some(0.1);
    config.workers = 2;
    config
}

#[test]
fn test_skip_existing_does_not_recompute() {
    let videos = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    common::write_pair(videos.path(), "PEO", 1, &common::decaying_widths());
    common::write_pair(videos.path(), "PEO", 2, &common::decaying_widths());
    let config = test_config(&output);

    let first_spy = Arc::new(SpyReporter::default());
    let mut first = run_batch(videos.path(), &config, first_spy.clone()).unwrap();
    assert_eq!(first_spy.binarize_stages.load(Ordering::SeqCst), 2);
    assert_eq!(first.rows.len(), 2);
    assert_eq!(first.skipped, 0);

    let second_spy = Arc::new(SpyReporter::default());
    let mut second = run_batch(videos.path(), &config, second_spy.clone()).unwrap();
    assert_eq!(second_spy.binarize_stages.load(Ordering::SeqCst), 0);
    assert_eq!(second_spy.skipped.load(Ordering::SeqCst), 2);
    assert_eq!(second.skipped, 2);

    first.rows.sort_by(|a, b| a.name.cmp(&b.name));
    second.rows.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(first.rows, second.rows);
}

#[test]
fn test_skip_existing_disabled_recomputes() {
    let videos = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    common::write_pair(videos.path(), "PEO", 1, &common::decaying_widths());
    let mut config = test_config(&output);

    run_batch(videos.path(), &config, Arc::new(NoOpReporter)).unwrap();
    config.skip_existing = false;
    let spy = Arc::new(SpyReporter::default());
    run_batch(videos.path(), &config, spy.clone()).unwrap();
    assert_eq!(spy.binarize_stages.load(Ordering::SeqCst), 1);
}

#[test]
fn test_excluded_existing_rows_are_not_reported() {
    let videos = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    common::write_pair(videos.path(), "PEO", 1, &common::decaying_widths());
    let mut config = test_config(&output);

    run_batch(videos.path(), &config, Arc::new(NoOpReporter)).unwrap();
    config.include_existing = false;
    let report = run_batch(videos.path(), &config, Arc::new(NoOpReporter)).unwrap();
    assert!(report.rows.is_empty());
    assert_eq!(report.skipped, 1);
}

#[test]
fn test_partial_failure_is_isolated() {
    let videos = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    common::write_pair(videos.path(), "PEO", 1, &common::decaying_widths());
    common::write_pair(videos.path(), "PEO", 2, &common::decaying_widths());
    // Experiment without a background video.
    common::write_video(
        &videos.path().join(common::video_name("PEO", 3, "exp")),
        &common::decaying_widths(),
    );
    let config = test_config(&output);

    let spy = Arc::new(SpyReporter::default());
    let report = run_batch(videos.path(), &config, spy.clone()).unwrap();

    assert_eq!(report.rows.len(), 3);
    assert_eq!(spy.finished.load(Ordering::SeqCst), 3);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.name, "20240101_PEO_fps-25k_3");
    assert_eq!(failure.kind, ErrorKind::MissingInput);

    let ok = report
        .rows
        .iter()
        .filter(|r| r.status == RowStatus::Converged)
        .count();
    assert_eq!(ok, 2);

    let failed_row = report.rows.iter().find(|r| r.is_failed()).unwrap();
    assert_eq!(failed_row.name, failure.name);
    assert_eq!(failed_row.error.as_ref().unwrap().kind, ErrorKind::MissingInput);
    assert_eq!(failed_row.tags.get("run").map(String::as_str), Some("3"));

    // Failed pairs leave nothing to skip, so they are retried next time.
    let paths = ArtifactPaths::new(output.path(), &failure.name);
    assert!(!paths.summary_csv.exists());

    let summary = std::fs::read_to_string(report.summary_path.unwrap()).unwrap();
    assert_eq!(summary.lines().count(), 4);
}

#[test]
fn test_empty_discovery_yields_empty_report() {
    let videos = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let config = test_config(&output);

    let report = run_batch(videos.path(), &config, Arc::new(NoOpReporter)).unwrap();
    assert!(report.rows.is_empty());
    assert!(report.failures.is_empty());
    assert!(report.summary_path.is_none());
}

#[test]
fn test_missing_root_is_an_error() {
    let output = TempDir::new().unwrap();
    let config = test_config(&output);
    let err = run_batch(
        &output.path().join("does-not-exist"),
        &config,
        Arc::new(NoOpReporter),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingInput);
}

#[test]
fn test_invalid_config_fails_before_discovery() {
    let videos = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let mut config = test_config(&output);
    config.fps_override = Some(-1.0);
    let err = run_batch(videos.path(), &config, Arc::new(NoOpReporter)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

/// Panics once a pair reaches the fitting stage.
struct PanickingReporter;

impl ProgressReporter for PanickingReporter {
    fn begin_stage(&self, _name: &str, stage: BatchStage, _total: Option<usize>) {
        if stage == BatchStage::Fitting {
            panic!("reporter exploded");
        }
    }
}

fn pair_paths(output: &TempDir, run: u32) -> ArtifactPaths {
    ArtifactPaths::new(output.path(), &format!("20240101_PEO_fps-25k_{run}"))
}

#[test]
fn test_jittered_series_is_fitted_in_full() {
    let videos = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    common::write_pair(videos.path(), "PEO", 1, &common::jittered_widths());
    let config = test_config(&output);

    let report = run_batch(videos.path(), &config, Arc::new(NoOpReporter)).unwrap();
    let row = &report.rows[0];
    assert_eq!(row.status, RowStatus::Converged);
    assert_eq!(row.valid_points, 16);
    assert_eq!(row.fit.as_ref().unwrap().points_used, row.valid_points);
}

#[test]
fn test_corrupt_first_frame_fails_pair() {
    let videos = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    common::write_pair(videos.path(), "PEO", 1, &common::decaying_widths());
    let exp = videos.path().join(common::video_name("PEO", 1, "exp"));
    std::fs::write(exp.join("000.png"), b"not an image").unwrap();
    let config = test_config(&output);

    let report = run_batch(videos.path(), &config, Arc::new(NoOpReporter)).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, ErrorKind::CorruptFrame);
    assert!(!pair_paths(&output, 1).summary_csv.exists());
}

#[test]
fn test_corrupt_later_frame_is_only_dropped() {
    let videos = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    common::write_pair(videos.path(), "PEO", 1, &common::decaying_widths());
    let exp = videos.path().join(common::video_name("PEO", 1, "exp"));
    std::fs::write(exp.join("004.png"), b"not an image").unwrap();
    let config = test_config(&output);

    let report = run_batch(videos.path(), &config, Arc::new(NoOpReporter)).unwrap();
    assert!(report.failures.is_empty());
    let row = &report.rows[0];
    assert_eq!(row.status, RowStatus::Converged);
    assert_eq!(row.frame_count, 10);
    assert_eq!(row.valid_points, 9);

    let series = read_series_csv(&pair_paths(&output, 1).series_csv).unwrap();
    assert!(series.points().iter().all(|p| p.frame_index != 4));
}

#[test]
fn test_worker_panic_becomes_failed_row() {
    let videos = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    common::write_pair(videos.path(), "PEO", 1, &common::decaying_widths());
    let config = test_config(&output);

    let report = run_batch(videos.path(), &config, Arc::new(PanickingReporter)).unwrap();
    assert_eq!(report.rows.len(), 1);
    assert!(report.rows[0].is_failed());
    assert_eq!(report.failures[0].kind, ErrorKind::WorkerPanic);
    assert!(report.failures[0].message.contains("reporter exploded"));
    assert!(report.summary_path.unwrap().is_file());
}

#[test]
fn test_unsaved_frame_image_keeps_measurement() {
    let videos = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    common::write_pair(videos.path(), "PEO", 1, &common::decaying_widths());
    // A directory where frame 4's silhouette would be written.
    let paths = pair_paths(&output, 1);
    std::fs::create_dir_all(ArtifactPaths::frame_file(&paths.binary_dir, 4, "png")).unwrap();
    let config = test_config(&output);

    let report = run_batch(videos.path(), &config, Arc::new(NoOpReporter)).unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(report.rows[0].valid_points, 10);
    assert!(ArtifactPaths::frame_file(&paths.binary_dir, 3, "png").is_file());
}

#[test]
fn test_auto_top_excludes_nozzle_rows() {
    let videos = TempDir::new().unwrap();
    common::write_nozzle_pair(videos.path(), "PEO", 1, &common::decaying_widths());

    let plain_out = TempDir::new().unwrap();
    run_batch(videos.path(), &test_config(&plain_out), Arc::new(NoOpReporter)).unwrap();
    let plain = read_series_csv(&pair_paths(&plain_out, 1).series_csv).unwrap();
    // Only the strips of nozzle wetting show in the top rows.
    assert!(plain.points()[0].diameter < 2.0);
    let plain_params = read_params_csv(&pair_paths(&plain_out, 1).params_csv).unwrap();
    assert!(!plain_params.contains_key("window_top"));

    let auto_out = TempDir::new().unwrap();
    let mut config = test_config(&auto_out);
    config.exclusion.auto_top = true;
    run_batch(videos.path(), &config, Arc::new(NoOpReporter)).unwrap();
    let paths = pair_paths(&auto_out, 1);
    let series = read_series_csv(&paths.series_csv).unwrap();
    let expected: Vec<f64> = common::decaying_widths()
        .iter()
        .map(|&w| w as f64 * 0.1)
        .collect();
    for (got, want) in series.diameters().iter().zip(&expected) {
        assert!((got - want).abs() < 1e-9, "{got} != {want}");
    }

    let params = read_params_csv(&paths.params_csv).unwrap();
    assert_eq!(params["window_top"], common::NOZZLE_ROWS.to_string());
    assert_eq!(params["frame_width"], common::FRAME_WIDTH.to_string());
    assert_eq!(params["mm_per_pixel"], "0.1");
}
