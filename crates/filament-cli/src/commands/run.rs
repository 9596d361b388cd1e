use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use filament_core::batch::config::BatchConfig;
use filament_core::batch::run_batch;
use tracing::debug;

use super::{load_config, threshold_method, ThresholdArg};
use crate::progress::BatchProgress;
use crate::summary::{print_batch_summary, print_report};

#[derive(Args)]
pub struct RunArgs {
    /// Folder containing one sub-folder of frames per video
    pub folder: PathBuf,

    /// Batch config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output folder (default: <folder>/analysis)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Worker threads (0 = all cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Frame rate, overriding the fps tag in folder names
    #[arg(long)]
    pub fps: Option<f64>,

    /// Fixed pixel scale in mm/px instead of needle calibration
    #[arg(long)]
    pub mm_per_pixel: Option<f64>,

    /// Threshold method for silhouettes
    #[arg(long, value_enum)]
    pub threshold: Option<ThresholdArg>,

    /// Threshold in [0, 1] for `--threshold fixed`
    #[arg(long, required_if_eq("threshold", "fixed"))]
    pub threshold_value: Option<f32>,

    /// Recompute pairs whose results already exist
    #[arg(long)]
    pub force: bool,

    /// Save cropped frames
    #[arg(long)]
    pub save_crop: bool,

    /// Save background-subtracted frames
    #[arg(long)]
    pub save_bg_sub: bool,

    /// Do not save binary silhouettes
    #[arg(long)]
    pub no_binary: bool,
}

pub fn run(args: &RunArgs, verbose: bool) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args, verbose)?;

    let output = config.output_dir(&args.folder);
    debug!(output = %output.display(), workers = config.worker_count(), "Resolved batch settings");
    print_batch_summary(&config, &args.folder, &output);

    let progress = Arc::new(BatchProgress::new());
    let report = run_batch(&args.folder, &config, progress.clone())
        .with_context(|| format!("Batch over {} failed", args.folder.display()))?;
    progress.finish();

    print_report(&report);
    Ok(())
}

fn apply_overrides(config: &mut BatchConfig, args: &RunArgs, verbose: bool) -> Result<()> {
    if let Some(ref output) = args.output {
        config.output = Some(output.clone());
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if args.fps.is_some() {
        config.fps_override = args.fps;
    }
    if args.mm_per_pixel.is_some() {
        config.calibration.mm_per_pixel = args.mm_per_pixel;
    }
    if let Some(ref threshold) = args.threshold {
        config.binarize.threshold_method = threshold_method(threshold, args.threshold_value)?;
    }
    if args.force {
        config.skip_existing = false;
    }
    config.save.crop |= args.save_crop;
    config.save.bg_sub |= args.save_bg_sub;
    if args.no_binary {
        config.save.binary = false;
    }
    config.verbose |= verbose;
    Ok(())
}
