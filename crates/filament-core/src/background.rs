use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{FilamentError, Result};
use crate::frame::Frame;

/// Build the static background image as the per-pixel median of `frames`.
///
/// Transient objects (passing droplets, flicker) drop out of the median.
/// Uses `select_nth_unstable` for O(n) median without full sort and
/// parallelizes at the row level for large frames.
pub fn median_background(frames: &[Frame]) -> Result<Frame> {
    if frames.is_empty() {
        return Err(FilamentError::EmptySequence);
    }

    let (h, w) = frames[0].dim();
    if let Some(odd) = frames.iter().find(|f| f.dim() != (h, w)) {
        return Err(FilamentError::DimensionMismatch {
            expected: (h, w),
            actual: odd.dim(),
        });
    }
    let n = frames.len();

    let mut result = Array2::<f32>::zeros((h, w));
    if h * w >= PARALLEL_PIXEL_THRESHOLD && n > 1 {
        result
            .axis_iter_mut(ndarray::Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut out)| {
                let mut pixel_values = vec![0.0f32; n];
                for (col, value) in out.iter_mut().enumerate() {
                    for (i, frame) in frames.iter().enumerate() {
                        pixel_values[i] = frame.data[[row, col]];
                    }
                    *value = compute_median(&mut pixel_values);
                }
            });
    } else {
        let mut pixel_values = vec![0.0f32; n];
        for ((row, col), value) in result.indexed_iter_mut() {
            for (i, frame) in frames.iter().enumerate() {
                pixel_values[i] = frame.data[[row, col]];
            }
            *value = compute_median(&mut pixel_values);
        }
    }

    Ok(Frame::new(result, frames[0].original_bit_depth))
}

fn compute_median(pixel_values: &mut [f32]) -> f32 {
    let n = pixel_values.len();
    if n == 1 {
        pixel_values[0]
    } else if n % 2 == 1 {
        let mid = n / 2;
        *pixel_values
            .select_nth_unstable_by(mid, |a, b| a.total_cmp(b))
            .1
    } else {
        let mid = n / 2;
        pixel_values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        let upper = pixel_values[mid];
        let lower = *pixel_values[..mid]
            .select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b))
            .1;
        (lower + upper) / 2.0
    }
}
