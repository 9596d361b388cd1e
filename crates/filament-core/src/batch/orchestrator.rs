use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::consts::SUMMARY_FILENAME;
use crate::discovery::{discover_pairs, VideoPair};
use crate::error::{FilamentError, Result};
use crate::io::table::{read_summary_csv, write_summary_csv};

use super::artifacts::{outputs_exist, ArtifactPaths};
use super::config::BatchConfig;
use super::types::{BatchReport, PairFailure, ProgressReporter, SummaryRow};
use super::worker::analyze_pair;

/// Discover every video pair under `root` and analyse them in parallel.
///
/// Per-pair failures are recorded in the report; only configuration and
/// discovery errors fail the whole batch.
pub fn run_batch(
    root: &Path,
    config: &BatchConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BatchReport> {
    config.validate()?;
    let pairs = discover_pairs(root, &config.discovery)?;
    info!(root = %root.display(), pairs = pairs.len(), "Discovered video pairs");
    run_pairs(&pairs, config, &config.output_dir(root), &reporter)
}

enum Planned<'a> {
    Loaded(SummaryRow),
    Compute(&'a VideoPair, ArtifactPaths),
}

/// Analyse `pairs`, writing artifacts under `output`.
pub fn run_pairs(
    pairs: &[VideoPair],
    config: &BatchConfig,
    output: &Path,
    reporter: &Arc<dyn ProgressReporter>,
) -> Result<BatchReport> {
    reporter.begin_batch(pairs.len());
    if pairs.is_empty() {
        return Ok(BatchReport::default());
    }
    std::fs::create_dir_all(output)?;

    let mut skipped = 0;
    let mut planned = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let paths = ArtifactPaths::new(output, &pair.name);
        if config.skip_existing && outputs_exist(&paths) {
            if !config.include_existing {
                skip(config, reporter, &pair.name, &mut skipped);
                continue;
            }
            match load_existing(&paths) {
                Ok(row) => {
                    skip(config, reporter, &pair.name, &mut skipped);
                    planned.push(Planned::Loaded(row));
                    continue;
                }
                Err(e) => {
                    warn!(name = %pair.name, error = %e, "Saved result unreadable, recomputing");
                }
            }
        }
        planned.push(Planned::Compute(pair, paths));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_count())
        .build()
        .map_err(|e| FilamentError::InvalidConfig(format!("thread pool: {e}")))?;
    debug!(workers = pool.current_num_threads(), "Worker pool ready");

    let rows: Vec<SummaryRow> = pool.install(|| {
        planned
            .into_par_iter()
            .map(|plan| match plan {
                Planned::Loaded(row) => row,
                Planned::Compute(pair, paths) => run_one(pair, config, &paths, reporter),
            })
            .collect()
    });

    let failures: Vec<PairFailure> = rows
        .iter()
        .filter(|r| r.is_failed())
        .filter_map(|r| {
            r.error.as_ref().map(|e| PairFailure {
                name: r.name.clone(),
                kind: e.kind,
                message: e.message.clone(),
            })
        })
        .collect();

    let summary_path = if rows.is_empty() {
        None
    } else {
        let mut sorted = rows.clone();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        let path = output.join(SUMMARY_FILENAME);
        write_summary_csv(&sorted, &path)?;
        Some(path)
    };

    info!(
        rows = rows.len(),
        failed = failures.len(),
        skipped,
        "Batch complete"
    );

    Ok(BatchReport {
        rows,
        failures,
        skipped,
        summary_path,
    })
}

/// Analyse one pair, turning errors and panics into a failed row.
fn run_one(
    pair: &VideoPair,
    config: &BatchConfig,
    paths: &ArtifactPaths,
    reporter: &Arc<dyn ProgressReporter>,
) -> SummaryRow {
    log_pair(config, &pair.name, "Analysing");
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        analyze_pair(pair, config, paths, reporter.as_ref())
    }))
    .unwrap_or_else(|payload| Err(FilamentError::WorkerPanic(panic_message(payload.as_ref()))));

    let row = match outcome {
        Ok(row) => row,
        Err(e) => {
            warn!(name = %pair.name, kind = %e.kind(), error = %e, "Pair failed");
            SummaryRow::failed(&pair.name, pair.tags.clone(), &e)
        }
    };
    reporter.finish_pair(&pair.name, row.status);
    row
}

fn skip(
    config: &BatchConfig,
    reporter: &Arc<dyn ProgressReporter>,
    name: &str,
    skipped: &mut usize,
) {
    *skipped += 1;
    log_pair(config, name, "Skipping, results exist");
    reporter.pair_skipped(name);
}

fn load_existing(paths: &ArtifactPaths) -> Result<SummaryRow> {
    read_summary_csv(&paths.summary_csv)?
        .into_iter()
        .next()
        .ok_or_else(|| {
            FilamentError::MalformedTable(format!("{} has no rows", paths.summary_csv.display()))
        })
}

fn log_pair(config: &BatchConfig, name: &str, message: &str) {
    if config.verbose {
        info!(name, "{message}");
    } else {
        debug!(name, "{message}");
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
