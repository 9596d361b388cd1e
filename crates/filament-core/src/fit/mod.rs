pub mod config;
pub mod solver;
pub mod viscosity;
pub mod window;

pub use config::{FitConfig, FitWindow, PhysicalConstants};
pub use solver::{fit_series, FitResult};
pub use viscosity::ViscosityRecord;
pub use window::select_window;
