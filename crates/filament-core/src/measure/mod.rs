pub mod calibration;
pub mod diameter;
pub mod series;

pub use calibration::{mm_per_pixel_from_nozzle, nozzle_width};
pub use diameter::{bottom_border, longest_run, measure_diameter, top_border, ExclusionBands};
pub use series::{assemble_series, DiameterPoint, DiameterTimeSeries, ExtensionPoint};
