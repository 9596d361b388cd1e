use crate::measure::{DiameterPoint, DiameterTimeSeries};

use super::config::FitWindow;

/// Points of `series` that fall inside `window`, in time order.
pub fn select_window<'a>(series: &'a DiameterTimeSeries, window: &FitWindow) -> &'a [DiameterPoint] {
    let points = series.points();
    match window {
        FitWindow::Full => points,
        FitWindow::Time { min_time, max_time } => {
            let lo = min_time.unwrap_or(f64::NEG_INFINITY);
            let hi = max_time.unwrap_or(f64::INFINITY);
            let start = points.partition_point(|p| p.time < lo);
            let end = points.partition_point(|p| p.time < hi).max(start);
            &points[start..end]
        }
        FitWindow::Diameter { upper, lower } => {
            let Some(first) = points.first() else {
                return points;
            };
            if first.diameter <= 0.0 {
                return &points[..0];
            }
            let ratio = |p: &DiameterPoint| p.diameter / first.diameter;
            let start = points
                .iter()
                .position(|p| ratio(p) <= *upper)
                .unwrap_or(points.len());
            let len = points[start..]
                .iter()
                .take_while(|p| ratio(p) > *lower)
                .count();
            &points[start..start + len]
        }
        FitWindow::Monotone => {
            let (start, len) = longest_non_increasing_run(points);
            &points[start..start + len]
        }
    }
}

/// `(start, len)` of the longest run where each diameter is no larger than
/// the previous one. Ties keep the earliest run.
fn longest_non_increasing_run(points: &[DiameterPoint]) -> (usize, usize) {
    if points.is_empty() {
        return (0, 0);
    }
    let mut best = (0, 1);
    let mut run_start = 0;
    for i in 1..points.len() {
        if points[i].diameter > points[i - 1].diameter {
            run_start = i;
        }
        let len = i - run_start + 1;
        if len > best.1 {
            best = (run_start, len);
        }
    }
    best
}
