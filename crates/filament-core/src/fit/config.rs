use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_LAMBDA_MAX, DEFAULT_LAMBDA_MIN, DEFAULT_MAX_ITERATIONS, DEFAULT_MIN_FIT_POINTS,
    DEFAULT_MIN_R_SQUARED, DEFAULT_NEEDLE_DIAMETER_MM, DEFAULT_SURFACE_TENSION,
};

/// Portion of the diameter series used for the fit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum FitWindow {
    /// Every point of the series.
    #[default]
    Full,
    /// Points with `min_time <= t < max_time`; a missing bound is open.
    Time {
        #[serde(default)]
        min_time: Option<f64>,
        #[serde(default)]
        max_time: Option<f64>,
    },
    /// Points whose diameter relative to the first point lies in
    /// `(lower, upper]`, e.g. the elasto-capillary band between 0.1 and 0.045.
    Diameter { upper: f64, lower: f64 },
    /// Longest run of non-increasing diameters. A single pixel of jitter
    /// ends a run, so this suits smoothed or clean series only.
    Monotone,
}

impl std::fmt::Display for FitWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "Full series"),
            Self::Time { min_time, max_time } => {
                let lo = min_time.map(|t| format!("{t}")).unwrap_or_else(|| "-inf".into());
                let hi = max_time.map(|t| format!("{t}")).unwrap_or_else(|| "inf".into());
                write!(f, "Time [{lo}, {hi}) s")
            }
            Self::Diameter { upper, lower } => write!(f, "D/D(0) in ({lower}, {upper}]"),
            Self::Monotone => write!(f, "Monotone run"),
        }
    }
}

/// Settings for the exponential decay fit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitConfig {
    #[serde(default)]
    pub window: FitWindow,
    /// Smallest physically plausible relaxation time (s).
    #[serde(default = "default_lambda_min")]
    pub lambda_min: f64,
    /// Largest physically plausible relaxation time (s).
    #[serde(default = "default_lambda_max")]
    pub lambda_max: f64,
    /// Starting relaxation time for the solver; seeded from a log-linear
    /// regression when absent.
    #[serde(default)]
    pub initial_lambda: Option<f64>,
    /// Minimum R² (log space) for a fit to count as converged.
    #[serde(default = "default_min_r_squared")]
    pub min_r_squared: f64,
    /// Fewest points the window may contain.
    #[serde(default = "default_min_points")]
    pub min_points: usize,
    /// Solver iteration cap.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_lambda_min() -> f64 {
    DEFAULT_LAMBDA_MIN
}
fn default_lambda_max() -> f64 {
    DEFAULT_LAMBDA_MAX
}
fn default_min_r_squared() -> f64 {
    DEFAULT_MIN_R_SQUARED
}
fn default_min_points() -> usize {
    DEFAULT_MIN_FIT_POINTS
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            window: FitWindow::default(),
            lambda_min: DEFAULT_LAMBDA_MIN,
            lambda_max: DEFAULT_LAMBDA_MAX,
            initial_lambda: None,
            min_r_squared: DEFAULT_MIN_R_SQUARED,
            min_points: DEFAULT_MIN_FIT_POINTS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Fluid and geometry constants used to turn a relaxation time into a
/// viscosity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhysicalConstants {
    /// Surface tension in N/m.
    #[serde(default = "default_surface_tension")]
    pub surface_tension: f64,
    /// Needle (nozzle) outer diameter in mm.
    #[serde(default = "default_needle_diameter")]
    pub needle_diameter_mm: f64,
}

fn default_surface_tension() -> f64 {
    DEFAULT_SURFACE_TENSION
}
fn default_needle_diameter() -> f64 {
    DEFAULT_NEEDLE_DIAMETER_MM
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            surface_tension: DEFAULT_SURFACE_TENSION,
            needle_diameter_mm: DEFAULT_NEEDLE_DIAMETER_MM,
        }
    }
}
