use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{ErrorKind, FilamentError};
use crate::fit::{FitResult, ViscosityRecord};
use crate::io::crop::CropRect;

/// Batch processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchStage {
    Background,
    Binarizing,
    Fitting,
    Writing,
}

impl std::fmt::Display for BatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Background => write!(f, "Building background"),
            Self::Binarizing => write!(f, "Measuring frames"),
            Self::Fitting => write!(f, "Fitting decay"),
            Self::Writing => write!(f, "Writing results"),
        }
    }
}

/// Thread-safe progress reporting for the batch.
///
/// Pair-level calls arrive from worker threads in completion order. All
/// methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// The batch found `total_pairs` pairs to consider.
    fn begin_batch(&self, _total_pairs: usize) {}

    /// A stage started for pair `name`. `total_items` is the number of work
    /// items (e.g. frames), if known.
    fn begin_stage(&self, _name: &str, _stage: BatchStage, _total_items: Option<usize>) {}

    /// One work item within the current stage of `name` has completed.
    fn advance(&self, _name: &str, _items_done: usize) {}

    /// The current stage of `name` is complete.
    fn finish_stage(&self, _name: &str) {}

    /// Pair `name` was analysed, successfully or not.
    fn finish_pair(&self, _name: &str, _status: RowStatus) {}

    /// Pair `name` was not analysed because its results already exist.
    fn pair_skipped(&self, _name: &str) {}
}

/// No-op progress reporter.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Outcome class of a summary row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowStatus {
    /// Fit converged; the viscosity is trustworthy.
    Converged,
    /// Analysis ran but the fit was rejected.
    NotConverged,
    /// The pair could not be analysed.
    Failed,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::NotConverged => "not_converged",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "converged" => Some(Self::Converged),
            "not_converged" => Some(Self::NotConverged),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowError {
    pub kind: ErrorKind,
    pub message: String,
}

/// One line of the batch summary table.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRow {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    pub status: RowStatus,
    /// Frames in the experiment video.
    pub frame_count: usize,
    /// Frames that produced a valid diameter.
    pub valid_points: usize,
    pub fps: Option<f64>,
    pub mm_per_pixel: Option<f64>,
    pub fit: Option<FitResult>,
    pub viscosity: Option<ViscosityRecord>,
    pub error: Option<RowError>,
}

impl SummaryRow {
    /// Row for a pair whose analysis failed with `err`.
    pub fn failed(name: &str, tags: BTreeMap<String, String>, err: &FilamentError) -> Self {
        Self {
            name: name.to_string(),
            tags,
            status: RowStatus::Failed,
            frame_count: 0,
            valid_points: 0,
            fps: None,
            mm_per_pixel: None,
            fit: None,
            viscosity: None,
            error: Some(RowError {
                kind: err.kind(),
                message: err.to_string(),
            }),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == RowStatus::Failed
    }
}

/// A pair that could not be analysed.
#[derive(Clone, Debug, PartialEq)]
pub struct PairFailure {
    pub name: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Aggregated result of a batch run.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    /// One row per pair, failed pairs included, in completion order.
    pub rows: Vec<SummaryRow>,
    /// The failed subset of `rows`, with error details.
    pub failures: Vec<PairFailure>,
    /// Pairs skipped because their artifacts already existed.
    pub skipped: usize,
    /// Where the summary table was written, if any rows were produced.
    pub summary_path: Option<PathBuf>,
}

/// Image geometry and calibration one video was analysed with.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageParams {
    pub frame_width: usize,
    pub frame_height: usize,
    pub crop: CropRect,
    pub background_frames: usize,
    pub fps: f64,
    pub mm_per_pixel: f64,
    /// Row and measured width of the needle when the scale was calibrated
    /// from it.
    pub nozzle: Option<(usize, usize)>,
    /// First measured row of the cropped frame, when detected from the
    /// background.
    pub window_top: Option<usize>,
}

impl ImageParams {
    /// `(key, value)` pairs in file order; absent values are empty.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let opt = |v: Option<usize>| v.map(|v| v.to_string()).unwrap_or_default();
        vec![
            ("frame_width", self.frame_width.to_string()),
            ("frame_height", self.frame_height.to_string()),
            ("crop_x", self.crop.x.to_string()),
            ("crop_y", self.crop.y.to_string()),
            ("crop_width", self.crop.width.to_string()),
            ("crop_height", self.crop.height.to_string()),
            ("background_frames", self.background_frames.to_string()),
            ("fps_hz", self.fps.to_string()),
            ("mm_per_pixel", self.mm_per_pixel.to_string()),
            ("nozzle_row", opt(self.nozzle.map(|(row, _)| row))),
            ("nozzle_width_px", opt(self.nozzle.map(|(_, width)| width))),
            ("window_top", opt(self.window_top)),
        ]
    }
}
