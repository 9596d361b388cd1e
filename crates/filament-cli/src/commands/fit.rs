use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use filament_core::fit::{fit_series, FitWindow, ViscosityRecord};
use filament_core::io::table::read_series_csv;

use super::load_config;
use crate::summary::print_fit;

#[derive(Args)]
pub struct FitArgs {
    /// Diameter series CSV (frame_index,time_s,diameter_mm)
    pub series: PathBuf,

    /// Batch config file (TOML); its fit and constants sections are used
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fit only points at or after this time (s)
    #[arg(long)]
    pub min_time: Option<f64>,

    /// Fit only points before this time (s)
    #[arg(long)]
    pub max_time: Option<f64>,

    /// Fit only the longest non-increasing run of points
    #[arg(long, conflicts_with_all = ["min_time", "max_time"])]
    pub monotone: bool,

    /// Surface tension in N/m
    #[arg(long)]
    pub surface_tension: Option<f64>,
}

pub fn run(args: &FitArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut fit_config = config.fit;
    let mut constants = config.constants;

    if args.monotone {
        fit_config.window = FitWindow::Monotone;
    } else if args.min_time.is_some() || args.max_time.is_some() {
        fit_config.window = FitWindow::Time {
            min_time: args.min_time,
            max_time: args.max_time,
        };
    }
    if let Some(sigma) = args.surface_tension {
        constants.surface_tension = sigma;
    }

    let series = read_series_csv(&args.series)
        .with_context(|| format!("Failed to read series {}", args.series.display()))?;
    let fit = fit_series(&series, &fit_config).context("Fit failed")?;
    let viscosity = ViscosityRecord::from_fit(&fit, &constants);

    print_fit(&fit, viscosity.as_ref());
    Ok(())
}
