use ndarray::s;
use serde::{Deserialize, Serialize};

use crate::error::{FilamentError, Result};
use crate::frame::Frame;

/// A rectangle in image coordinates for cropping.
#[derive(Clone, Debug, PartialEq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Validate the crop rect against source dimensions.
    pub fn validated(&self, src_w: u32, src_h: u32) -> Result<CropRect> {
        if self.width == 0 || self.height == 0 {
            return Err(FilamentError::InvalidConfig(
                "Crop width and height must be > 0".into(),
            ));
        }

        if self.x + self.width > src_w || self.y + self.height > src_h {
            return Err(FilamentError::InvalidConfig(format!(
                "Crop region ({},{} {}x{}) exceeds source dimensions ({src_w}x{src_h})",
                self.x, self.y, self.width, self.height
            )));
        }

        Ok(self.clone())
    }
}

/// Crop region expressed as fractions of the frame width and height.
///
/// `left`/`right` are fractions of the width, `top`/`bottom` of the height,
/// all in [0, 1]. The default keeps the whole frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CropRegion {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default = "one")]
    pub right: f64,
    #[serde(default = "one")]
    pub bottom: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for CropRegion {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: 1.0,
            bottom: 1.0,
        }
    }
}

impl CropRegion {
    /// Resolve the coefficients to a pixel rectangle for a `width` x `height`
    /// frame.
    pub fn resolve(&self, width: usize, height: usize) -> Result<CropRect> {
        let coeffs = [self.left, self.top, self.right, self.bottom];
        if coeffs.iter().any(|c| !c.is_finite() || !(0.0..=1.0).contains(c)) {
            return Err(FilamentError::InvalidConfig(format!(
                "Crop coefficients must lie in [0, 1], got {coeffs:?}"
            )));
        }

        let x0 = (self.left * width as f64).round() as u32;
        let x1 = (self.right * width as f64).round() as u32;
        let y0 = (self.top * height as f64).round() as u32;
        let y1 = (self.bottom * height as f64).round() as u32;

        if x1 <= x0 || y1 <= y0 {
            return Err(FilamentError::InvalidConfig(format!(
                "Crop region is empty for a {width}x{height} frame: {coeffs:?}"
            )));
        }

        CropRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
        .validated(width as u32, height as u32)
    }
}

/// Copy the `rect` region out of `frame`.
pub fn crop_frame(frame: &Frame, rect: &CropRect) -> Result<Frame> {
    let rect = rect.validated(frame.width() as u32, frame.height() as u32)?;
    let (y0, x0) = (rect.y as usize, rect.x as usize);
    let (y1, x1) = (y0 + rect.height as usize, x0 + rect.width as usize);

    let data = frame.data.slice(s![y0..y1, x0..x1]).to_owned();
    Ok(Frame::new(data, frame.original_bit_depth))
}
