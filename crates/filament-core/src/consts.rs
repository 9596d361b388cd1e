/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-10;

/// Number of histogram bins for Otsu's thresholding.
pub const OTSU_HISTOGRAM_BINS: usize = 256;

/// Largest raw background difference (full scale = 1.0) still treated as
/// sensor noise; about 13 grey levels of an 8-bit image.
pub const DEFAULT_MIN_CONTRAST: f32 = 0.05;

/// Default sigma multiplier for MeanPlusSigma thresholding.
pub const DEFAULT_SIGMA_MULTIPLIER: f32 = 2.0;

/// File extensions recognised as frames of an image-sequence video.
pub const FRAME_EXTENSIONS: [&str; 6] = ["png", "tif", "tiff", "bmp", "jpg", "jpeg"];

/// Default row (in the uncropped frame) used to measure the nozzle width.
pub const DEFAULT_NOZZLE_ROW: usize = 0;

/// Default needle outer diameter in millimetres (22G needle).
pub const DEFAULT_NEEDLE_DIAMETER_MM: f64 = 0.7176;

/// Default surface tension in N/m (water at room temperature).
pub const DEFAULT_SURFACE_TENSION: f64 = 0.072;

/// Default lower bound on the relaxation time (seconds).
pub const DEFAULT_LAMBDA_MIN: f64 = 1e-6;

/// Default upper bound on the relaxation time (seconds).
pub const DEFAULT_LAMBDA_MAX: f64 = 10.0;

/// Default minimum coefficient of determination for a converged fit.
pub const DEFAULT_MIN_R_SQUARED: f64 = 0.9;

/// Minimum number of points a fit window must contain.
pub const DEFAULT_MIN_FIT_POINTS: usize = 3;

/// Iteration cap for the Levenberg-Marquardt solver.
pub const DEFAULT_MAX_ITERATIONS: usize = 200;

/// Relative parameter change below which the solver is considered converged.
pub const SOLVER_TOLERANCE: f64 = 1e-10;

/// Initial Levenberg-Marquardt damping factor.
pub const SOLVER_INITIAL_DAMPING: f64 = 1e-3;

/// Damping factor above which the solver gives up improving the fit.
pub const SOLVER_MAX_DAMPING: f64 = 1e12;

/// Relaxation time guess used when the log-linear seed has no decay.
pub const FALLBACK_LAMBDA_GUESS: f64 = 1e-3;

/// Default file name of the aggregated summary table.
pub const SUMMARY_FILENAME: &str = "summary.csv";

/// Sub-folder holding persisted binary silhouettes.
pub const BINARY_DIR: &str = "bin";

/// Sub-folder holding persisted cropped frames.
pub const CROP_DIR: &str = "crop";

/// Sub-folder holding persisted background-subtracted frames.
pub const BG_SUB_DIR: &str = "bg_sub";
