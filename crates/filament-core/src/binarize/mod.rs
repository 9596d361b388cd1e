pub mod subtract;
pub mod threshold;

pub use subtract::subtract_background;
pub use threshold::{compute_threshold, otsu_threshold, ThresholdMethod};

use ndarray::Array2;

use crate::error::Result;
use crate::frame::{Frame, Silhouette};

/// Result of binarizing one frame.
#[derive(Clone, Debug)]
pub struct Binarized {
    /// Normalized absolute difference from the background, in [0, 1].
    pub difference: Frame,
    /// Threshold applied to `difference`.
    pub threshold: f32,
    /// `true` where the pixel belongs to the filament.
    pub silhouette: Silhouette,
}

/// Subtract `background` from `frame` and threshold the difference into a
/// silhouette.
///
/// A frame whose difference stays within `min_contrast` of the background
/// yields an empty silhouette. Fails with `DimensionMismatch` when the two
/// images differ in size.
pub fn binarize_frame(
    frame: &Frame,
    background: &Frame,
    method: &ThresholdMethod,
    sigma_mul: f32,
    min_contrast: f32,
) -> Result<Binarized> {
    let difference = subtract_background(frame, background, min_contrast)?;
    if difference.data.iter().all(|&v| v == 0.0) {
        return Ok(Binarized {
            silhouette: Array2::from_elem(difference.dim(), false),
            threshold: 1.0,
            difference,
        });
    }
    let threshold = compute_threshold(&difference.data, method, sigma_mul);
    let silhouette = apply_threshold(&difference.data, threshold);
    Ok(Binarized {
        difference,
        threshold,
        silhouette,
    })
}

/// Mark every pixel strictly above `threshold`.
pub fn apply_threshold(data: &Array2<f32>, threshold: f32) -> Silhouette {
    data.mapv(|v| v > threshold)
}
