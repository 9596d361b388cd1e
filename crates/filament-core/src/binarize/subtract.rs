use crate::consts::EPSILON;
use crate::error::{FilamentError, Result};
use crate::frame::Frame;

/// Absolute difference between `frame` and `background`, normalized so the
/// largest difference is 1.0.
///
/// When the largest raw difference does not exceed `min_contrast` the frame
/// holds no filament, only sensor noise, and the result is all zero rather
/// than noise stretched to full scale.
pub fn subtract_background(frame: &Frame, background: &Frame, min_contrast: f32) -> Result<Frame> {
    if frame.dim() != background.dim() {
        return Err(FilamentError::DimensionMismatch {
            expected: background.dim(),
            actual: frame.dim(),
        });
    }

    let mut diff = &frame.data - &background.data;
    diff.mapv_inplace(f32::abs);

    let max = diff.iter().copied().fold(0.0f32, f32::max);
    if max > min_contrast.max(EPSILON) {
        diff.mapv_inplace(|v| v / max);
    } else {
        diff.fill(0.0);
    }

    Ok(Frame::new(diff, frame.original_bit_depth))
}
