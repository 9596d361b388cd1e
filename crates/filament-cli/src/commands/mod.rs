pub mod analyze;
pub mod config;
pub mod fit;
pub mod run;

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use filament_core::batch::config::BatchConfig;
use filament_core::binarize::ThresholdMethod;

#[derive(Clone, ValueEnum)]
pub enum ThresholdArg {
    Otsu,
    MeanSigma,
    /// Fixed threshold given by --threshold-value
    Fixed,
}

/// Threshold method from the CLI flags; `value` is used by `fixed` only.
pub fn threshold_method(arg: &ThresholdArg, value: Option<f32>) -> Result<ThresholdMethod> {
    Ok(match arg {
        ThresholdArg::Otsu => ThresholdMethod::Otsu,
        ThresholdArg::MeanSigma => ThresholdMethod::MeanPlusSigma,
        ThresholdArg::Fixed => match value {
            Some(v) => ThresholdMethod::Fixed(v),
            None => bail!("--threshold fixed needs --threshold-value"),
        },
    })
}

/// Load a TOML batch config, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<BatchConfig> {
    let Some(path) = path else {
        return Ok(BatchConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Invalid config {}", path.display()))
}
