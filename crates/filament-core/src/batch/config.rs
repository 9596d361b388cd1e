use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::binarize::ThresholdMethod;
use crate::consts::{DEFAULT_MIN_CONTRAST, DEFAULT_NOZZLE_ROW, DEFAULT_SIGMA_MULTIPLIER};
use crate::discovery::DiscoveryConfig;
use crate::error::{FilamentError, Result};
use crate::fit::{FitConfig, PhysicalConstants};
use crate::io::crop::CropRegion;
use crate::measure::ExclusionBands;

/// Everything a batch run needs, enumerated once with typed defaults.
///
/// Unknown keys are rejected when deserializing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// Where per-video artifacts and the summary table go. Defaults to
    /// `<root>/analysis`.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub crop: CropRegion,
    #[serde(default)]
    pub exclusion: ExclusionBands,
    #[serde(default)]
    pub binarize: BinarizeConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    /// Frame rate used instead of the `fps` tag.
    #[serde(default)]
    pub fps_override: Option<f64>,
    /// Significant bits of 16-bit frames, e.g. 12 for cameras that store
    /// 12-bit data in 16-bit TIFFs. Such frames are stretched to full scale.
    #[serde(default)]
    pub sensor_bit_depth: Option<u8>,
    #[serde(default)]
    pub fit: FitConfig,
    #[serde(default)]
    pub constants: PhysicalConstants,
    /// Worker threads; 0 uses every available core.
    #[serde(default)]
    pub workers: usize,
    /// Skip pairs whose artifacts already exist.
    #[serde(default = "default_true")]
    pub skip_existing: bool,
    /// Load the saved result of skipped pairs into the summary.
    #[serde(default = "default_true")]
    pub include_existing: bool,
    #[serde(default)]
    pub save: SaveConfig,
    /// Report per-pair progress at info level.
    #[serde(default)]
    pub verbose: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output: None,
            discovery: DiscoveryConfig::default(),
            crop: CropRegion::default(),
            exclusion: ExclusionBands::default(),
            binarize: BinarizeConfig::default(),
            calibration: CalibrationConfig::default(),
            fps_override: None,
            sensor_bit_depth: None,
            fit: FitConfig::default(),
            constants: PhysicalConstants::default(),
            workers: 0,
            skip_existing: true,
            include_existing: true,
            save: SaveConfig::default(),
            verbose: false,
        }
    }
}

impl BatchConfig {
    /// Resolved output folder for a batch rooted at `root`.
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| root.join("analysis"))
    }

    /// Worker count with 0 resolved to the number of available cores.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    /// Reject settings no video could be analysed with.
    pub fn validate(&self) -> Result<()> {
        if let Some(fps) = self.fps_override {
            if !(fps.is_finite() && fps > 0.0) {
                return Err(FilamentError::InvalidConfig(format!(
                    "fps_override must be positive, got {fps}"
                )));
            }
        }
        if let Some(bits) = self.sensor_bit_depth {
            if !(1..=16).contains(&bits) {
                return Err(FilamentError::InvalidConfig(format!(
                    "sensor_bit_depth must lie in 1..=16, got {bits}"
                )));
            }
        }
        if let Some(scale) = self.calibration.mm_per_pixel {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(FilamentError::InvalidConfig(format!(
                    "mm_per_pixel must be positive, got {scale}"
                )));
            }
        }
        if !(self.fit.lambda_min > 0.0 && self.fit.lambda_min < self.fit.lambda_max) {
            return Err(FilamentError::InvalidConfig(format!(
                "relaxation time bounds [{}, {}] are not a valid range",
                self.fit.lambda_min, self.fit.lambda_max
            )));
        }
        if !(self.constants.surface_tension > 0.0 && self.constants.needle_diameter_mm > 0.0) {
            return Err(FilamentError::InvalidConfig(
                "surface tension and needle diameter must be positive".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.binarize.min_contrast) {
            return Err(FilamentError::InvalidConfig(format!(
                "min_contrast must lie in [0, 1), got {}",
                self.binarize.min_contrast
            )));
        }
        if let ThresholdMethod::Fixed(t) = self.binarize.threshold_method {
            if !(0.0..=1.0).contains(&t) {
                return Err(FilamentError::InvalidConfig(format!(
                    "fixed threshold must lie in [0, 1], got {t}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinarizeConfig {
    #[serde(default)]
    pub threshold_method: ThresholdMethod,
    /// Sigma multiplier for MeanPlusSigma method.
    #[serde(default = "default_sigma_multiplier")]
    pub sigma_multiplier: f32,
    /// Frames whose largest background difference does not exceed this
    /// (full scale = 1.0) have no filament.
    #[serde(default = "default_min_contrast")]
    pub min_contrast: f32,
}

fn default_sigma_multiplier() -> f32 {
    DEFAULT_SIGMA_MULTIPLIER
}

fn default_min_contrast() -> f32 {
    DEFAULT_MIN_CONTRAST
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            threshold_method: ThresholdMethod::default(),
            sigma_multiplier: DEFAULT_SIGMA_MULTIPLIER,
            min_contrast: DEFAULT_MIN_CONTRAST,
        }
    }
}

/// Pixel-to-millimetre scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationConfig {
    /// Fixed scale. When absent the needle width on `nozzle_row` of the
    /// first experiment frame is matched to the needle diameter.
    #[serde(default)]
    pub mm_per_pixel: Option<f64>,
    #[serde(default = "default_nozzle_row")]
    pub nozzle_row: usize,
}

fn default_nozzle_row() -> usize {
    DEFAULT_NOZZLE_ROW
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            mm_per_pixel: None,
            nozzle_row: DEFAULT_NOZZLE_ROW,
        }
    }
}

/// Intermediate images written next to each video's results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveConfig {
    #[serde(default = "default_true")]
    pub binary: bool,
    #[serde(default)]
    pub crop: bool,
    #[serde(default)]
    pub bg_sub: bool,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            binary: true,
            crop: false,
            bg_sub: false,
        }
    }
}
