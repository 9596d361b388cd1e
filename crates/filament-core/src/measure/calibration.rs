use crate::binarize::otsu_threshold;
use crate::error::{FilamentError, Result};
use crate::frame::Frame;

/// Width in pixels of the needle on `row` of an uncropped frame.
///
/// The needle is the longest run of pixels darker than the frame's Otsu
/// threshold. Returns `None` when the row is out of range or has no dark
/// pixels.
pub fn nozzle_width(frame: &Frame, row: usize) -> Option<usize> {
    if row >= frame.height() {
        return None;
    }
    let threshold = otsu_threshold(&frame.data);
    let mut best = 0;
    let mut current = 0;
    for &v in frame.data.row(row).iter() {
        if v < threshold {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    (best > 0).then_some(best)
}

/// Millimetres per pixel from the known needle diameter and its measured
/// width on `row` of the first experiment frame, returned with that width.
pub fn mm_per_pixel_from_nozzle(
    frame: &Frame,
    row: usize,
    needle_diameter_mm: f64,
) -> Result<(f64, usize)> {
    let width = nozzle_width(frame, row).ok_or_else(|| {
        FilamentError::InvalidConfig(format!("no needle found on nozzle row {row}"))
    })?;
    Ok((needle_diameter_mm / width as f64, width))
}
