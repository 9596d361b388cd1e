use serde::{Deserialize, Serialize};

use crate::error::{FilamentError, Result};
use crate::frame::FrameMeasurement;

/// One valid diameter sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiameterPoint {
    pub frame_index: usize,
    /// Seconds since the first frame of the video.
    #[serde(rename = "time_s")]
    pub time: f64,
    #[serde(rename = "diameter_mm")]
    pub diameter: f64,
}

/// A series point with its diameter relative to the first point and the
/// local strain rate `-2 d(D/D0)/dt / (D/D0)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtensionPoint {
    pub frame_index: usize,
    #[serde(rename = "time_s")]
    pub time: f64,
    #[serde(rename = "diameter_mm")]
    pub diameter: f64,
    pub normalized_diameter: f64,
    #[serde(rename = "strain_rate_per_s")]
    pub strain_rate: f64,
}

/// Diameter-vs-time curve of one experiment video.
///
/// Times are strictly increasing and diameters non-negative; frames whose
/// diameter was invalid are absent rather than zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiameterTimeSeries {
    points: Vec<DiameterPoint>,
}

impl DiameterTimeSeries {
    /// Build a series from points, sorting by time and dropping duplicates,
    /// non-finite values and negative diameters.
    pub fn from_points(mut points: Vec<DiameterPoint>) -> Self {
        points.retain(|p| p.time.is_finite() && p.diameter.is_finite() && p.diameter >= 0.0);
        points.sort_by(|a, b| a.time.total_cmp(&b.time));
        points.dedup_by(|later, earlier| later.time <= earlier.time);
        Self { points }
    }

    pub fn points(&self) -> &[DiameterPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.time).collect()
    }

    pub fn diameters(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.diameter).collect()
    }

    /// Points normalised by the first diameter, with the local strain rate.
    ///
    /// The derivative uses second-order central differences inside the series
    /// and one-sided differences at both ends. Points whose strain rate is
    /// not finite (a zero diameter, or a series of one point) are left out.
    pub fn extension_points(&self) -> Vec<ExtensionPoint> {
        let Some(first) = self.points.first() else {
            return Vec::new();
        };
        let normalized: Vec<f64> = self
            .points
            .iter()
            .map(|p| p.diameter / first.diameter)
            .collect();
        let slope = gradient(&normalized, &self.times());

        self.points
            .iter()
            .zip(normalized.iter().zip(slope))
            .map(|(p, (&ratio, slope))| ExtensionPoint {
                frame_index: p.frame_index,
                time: p.time,
                diameter: p.diameter,
                normalized_diameter: ratio,
                strain_rate: -2.0 * slope / ratio,
            })
            .filter(|e| e.normalized_diameter.is_finite() && e.strain_rate.is_finite())
            .collect()
    }
}

/// Derivative of `y` with respect to unevenly spaced `x`.
fn gradient(y: &[f64], x: &[f64]) -> Vec<f64> {
    let n = y.len();
    if n < 2 {
        return vec![f64::NAN; n];
    }
    (0..n)
        .map(|i| {
            if i == 0 {
                (y[1] - y[0]) / (x[1] - x[0])
            } else if i == n - 1 {
                (y[n - 1] - y[n - 2]) / (x[n - 1] - x[n - 2])
            } else {
                let hs = x[i] - x[i - 1];
                let hd = x[i + 1] - x[i];
                (hs * hs * y[i + 1] + (hd * hd - hs * hs) * y[i] - hd * hd * y[i - 1])
                    / (hs * hd * (hd + hs))
            }
        })
        .collect()
}

/// Convert per-frame measurements into a calibrated time series.
///
/// Invalid measurements are dropped, pixel widths are scaled by
/// `mm_per_pixel`, and each point is stamped with `frame_index / fps`.
/// Measurements supplied out of order are sorted by frame index; a repeated
/// index keeps its first occurrence.
pub fn assemble_series(
    measurements: &[FrameMeasurement],
    fps: f64,
    mm_per_pixel: f64,
) -> Result<DiameterTimeSeries> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(FilamentError::InvalidConfig(format!(
            "frames per second must be positive, got {fps}"
        )));
    }
    if !(mm_per_pixel.is_finite() && mm_per_pixel > 0.0) {
        return Err(FilamentError::InvalidConfig(format!(
            "pixel calibration must be positive, got {mm_per_pixel}"
        )));
    }

    let mut ordered: Vec<&FrameMeasurement> = measurements.iter().collect();
    ordered.sort_by_key(|m| m.frame_index);
    ordered.dedup_by_key(|m| m.frame_index);

    let points = ordered
        .into_iter()
        .filter_map(|m| {
            m.diameter.pixels().map(|px| DiameterPoint {
                frame_index: m.frame_index,
                time: m.frame_index as f64 / fps,
                diameter: px * mm_per_pixel,
            })
        })
        .collect();

    Ok(DiameterTimeSeries { points })
}
