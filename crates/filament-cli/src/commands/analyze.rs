use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use filament_core::batch::{analyze_pair, ArtifactPaths};
use filament_core::discovery::VideoPair;

use super::{load_config, threshold_method, ThresholdArg};
use crate::progress::FrameProgress;
use crate::summary::print_row;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Folder of experiment frames
    pub experiment: PathBuf,

    /// Folder of background frames
    pub background: PathBuf,

    /// Frame rate of the experiment video
    #[arg(long)]
    pub fps: Option<f64>,

    /// Batch config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fixed pixel scale in mm/px instead of needle calibration
    #[arg(long)]
    pub mm_per_pixel: Option<f64>,

    /// Threshold method for silhouettes
    #[arg(long, value_enum)]
    pub threshold: Option<ThresholdArg>,

    /// Threshold in [0, 1] for `--threshold fixed`
    #[arg(long, required_if_eq("threshold", "fixed"))]
    pub threshold_value: Option<f32>,

    /// Output folder
    #[arg(short, long, default_value = "analysis")]
    pub output: PathBuf,

    /// Name used for the result files (default: experiment folder name)
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.fps.is_some() {
        config.fps_override = args.fps;
    }
    if args.mm_per_pixel.is_some() {
        config.calibration.mm_per_pixel = args.mm_per_pixel;
    }
    if let Some(ref threshold) = args.threshold {
        config.binarize.threshold_method = threshold_method(threshold, args.threshold_value)?;
    }
    config
        .validate()
        .context("Invalid analysis settings")?;

    let name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .experiment
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .context("Experiment folder has no usable name; pass --name")?,
    };
    if config.fps_override.is_none() {
        bail!("Frame rate unknown; pass --fps or set fps_override in the config");
    }

    let pair = VideoPair {
        name: name.clone(),
        experiment: args.experiment.clone(),
        background: Some(args.background.clone()),
        fps: None,
        tags: BTreeMap::new(),
    };
    let paths = ArtifactPaths::new(&args.output, &name);

    let progress = FrameProgress::new();
    let row = analyze_pair(&pair, &config, &paths, &progress)
        .with_context(|| format!("Analysis of {} failed", args.experiment.display()))?;
    progress.finish();

    print_row(&row);
    println!("Results saved to {}", paths.dir.display());
    Ok(())
}
