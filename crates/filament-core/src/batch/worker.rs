use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::background::median_background;
use crate::binarize::{binarize_frame, Binarized};
use crate::discovery::VideoPair;
use crate::error::{ErrorKind, FilamentError, Result};
use crate::fit::{fit_series, ViscosityRecord};
use crate::frame::{Diameter, Frame, FrameMeasurement};
use crate::io::crop::{crop_frame, CropRect};
use crate::io::image_io::{save_image, save_silhouette};
use crate::io::sequence::FrameSequence;
use crate::io::table::{write_params_csv, write_series_csv, write_summary_csv};
use crate::measure::{
    assemble_series, measure_diameter, mm_per_pixel_from_nozzle, top_border, ExclusionBands,
};

use super::artifacts::ArtifactPaths;
use super::config::BatchConfig;
use super::types::{BatchStage, ImageParams, ProgressReporter, RowError, RowStatus, SummaryRow};

/// Run the full analysis of one video pair and write its artifacts.
///
/// Errors abort only this pair. A fit that does not converge is still a
/// successful analysis and yields a `NotConverged` row.
pub fn analyze_pair(
    pair: &VideoPair,
    config: &BatchConfig,
    paths: &ArtifactPaths,
    reporter: &dyn ProgressReporter,
) -> Result<SummaryRow> {
    let name = pair.name.as_str();
    let background_dir = pair.background.as_deref().ok_or_else(|| {
        FilamentError::MissingInput(format!("no background video for '{name}'"))
    })?;

    let experiment =
        FrameSequence::open(&pair.experiment)?.with_sensor_bits(config.sensor_bit_depth);
    let background =
        FrameSequence::open(background_dir)?.with_sensor_bits(config.sensor_bit_depth);
    if experiment.is_empty() {
        return Err(FilamentError::EmptySequence);
    }
    debug!(
        name,
        experiment = %experiment.root().display(),
        frames = experiment.frame_count(),
        background_frames = background.frame_count(),
        "Opened videos"
    );

    let fps = config.fps_override.or(pair.fps).ok_or_else(|| {
        FilamentError::MissingInput(format!("no frame rate for '{name}'"))
    })?;

    let first = experiment.read_frame(0)?;
    let rect = config.crop.resolve(first.width(), first.height())?;
    let nozzle_row = config.calibration.nozzle_row;
    let (mm_per_pixel, nozzle) = match config.calibration.mm_per_pixel {
        Some(scale) => (scale, None),
        None => {
            let (scale, width) = mm_per_pixel_from_nozzle(
                &first,
                nozzle_row,
                config.constants.needle_diameter_mm,
            )?;
            (scale, Some((nozzle_row, width)))
        }
    };
    debug!(name, fps, mm_per_pixel, ?rect, "Pair setup");

    paths.create_dirs(&config.save)?;

    reporter.begin_stage(name, BatchStage::Background, Some(background.frame_count()));
    let reference = build_background(&background, &rect, name, reporter)?;
    reporter.finish_stage(name);

    let cropped_first = crop_frame(&first, &rect)?;
    if cropped_first.dim() != reference.dim() {
        return Err(FilamentError::DimensionMismatch {
            expected: reference.dim(),
            actual: cropped_first.dim(),
        });
    }

    let window_top = if config.exclusion.auto_top {
        let top = top_border(&reference);
        if top.is_none() {
            warn!(name, "No nozzle found in background, top band unchanged");
        }
        top
    } else {
        None
    };
    let bands = config.exclusion.with_window_top(window_top);

    let total = experiment.frame_count();
    reporter.begin_stage(name, BatchStage::Binarizing, Some(total));
    let counter = AtomicUsize::new(0);
    let measurements: Vec<FrameMeasurement> = (0..total)
        .into_par_iter()
        .map(|index| {
            let measured = if index == 0 {
                measure_frame(&first, index, &reference, &rect, &bands, config, paths)
            } else {
                experiment.read_frame(index).and_then(|frame| {
                    measure_frame(&frame, index, &reference, &rect, &bands, config, paths)
                })
            };
            let diameter = measured.unwrap_or_else(|e| {
                warn!(name, frame = index, error = %e, "Frame skipped");
                Diameter::Invalid
            });
            let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
            reporter.advance(name, done);
            FrameMeasurement {
                frame_index: index,
                diameter,
            }
        })
        .collect();
    reporter.finish_stage(name);

    let series = assemble_series(&measurements, fps, mm_per_pixel)?;
    debug!(name, valid = series.len(), total, "Diameter series assembled");

    reporter.begin_stage(name, BatchStage::Fitting, None);
    let fit = fit_series(&series, &config.fit)?;
    reporter.finish_stage(name);

    let viscosity = ViscosityRecord::from_fit(&fit, &config.constants);
    let (status, error) = if fit.converged {
        (RowStatus::Converged, None)
    } else {
        let message = fit
            .reason
            .clone()
            .unwrap_or_else(|| "fit rejected".to_string());
        (
            RowStatus::NotConverged,
            Some(RowError {
                kind: ErrorKind::NonConvergentFit,
                message,
            }),
        )
    };

    let row = SummaryRow {
        name: pair.name.clone(),
        tags: pair.tags.clone(),
        status,
        frame_count: total,
        valid_points: series.len(),
        fps: Some(fps),
        mm_per_pixel: Some(mm_per_pixel),
        fit: Some(fit),
        viscosity,
        error,
    };

    let params = ImageParams {
        frame_width: first.width(),
        frame_height: first.height(),
        crop: rect,
        background_frames: background.frame_count(),
        fps,
        mm_per_pixel,
        nozzle,
        window_top,
    };

    reporter.begin_stage(name, BatchStage::Writing, None);
    write_params_csv(&params, &paths.params_csv)?;
    write_series_csv(&series, &paths.series_csv)?;
    write_summary_csv(std::slice::from_ref(&row), &paths.summary_csv)?;
    reporter.finish_stage(name);

    if let Some(fit) = &row.fit {
        info!(
            name,
            status = %row.status,
            relaxation_time = fit.relaxation_time,
            r_squared = fit.r_squared,
            "Pair analysed"
        );
    }
    Ok(row)
}

/// Median of the cropped background frames. Undecodable frames are skipped;
/// the background fails only if none can be read.
fn build_background(
    sequence: &FrameSequence,
    rect: &CropRect,
    name: &str,
    reporter: &dyn ProgressReporter,
) -> Result<Frame> {
    let mut frames = Vec::with_capacity(sequence.frame_count());
    for (index, frame) in sequence.frames().enumerate() {
        match frame.and_then(|f| crop_frame(&f, rect)) {
            Ok(f) => frames.push(f),
            Err(e) => warn!(name, frame = index, error = %e, "Background frame skipped"),
        }
        reporter.advance(name, index + 1);
    }
    median_background(&frames)
}

/// Binarize and measure one frame. Failing to save its images is logged and
/// does not discard the measurement.
fn measure_frame(
    frame: &Frame,
    index: usize,
    reference: &Frame,
    rect: &CropRect,
    bands: &ExclusionBands,
    config: &BatchConfig,
    paths: &ArtifactPaths,
) -> Result<Diameter> {
    let cropped = crop_frame(frame, rect)?;
    let binarized = binarize_frame(
        &cropped,
        reference,
        &config.binarize.threshold_method,
        config.binarize.sigma_multiplier,
        config.binarize.min_contrast,
    )?;

    if let Err(e) = save_frame_images(&cropped, &binarized, index, config, paths) {
        warn!(frame = index, error = %e, "Frame images not saved");
    }

    Ok(measure_diameter(&binarized.silhouette, bands))
}

fn save_frame_images(
    cropped: &Frame,
    binarized: &Binarized,
    index: usize,
    config: &BatchConfig,
    paths: &ArtifactPaths,
) -> Result<()> {
    let save = &config.save;
    if save.binary {
        save_silhouette(
            &binarized.silhouette,
            &ArtifactPaths::frame_file(&paths.binary_dir, index, "png"),
        )?;
    }
    if save.crop {
        save_image(cropped, &ArtifactPaths::frame_file(&paths.crop_dir, index, "tif"))?;
    }
    if save.bg_sub {
        save_image(
            &binarized.difference,
            &ArtifactPaths::frame_file(&paths.bg_sub_dir, index, "tif"),
        )?;
    }
    Ok(())
}
