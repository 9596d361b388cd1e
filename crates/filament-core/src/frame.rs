use ndarray::Array2;

/// A single grayscale image frame.
/// Pixel values are f32 in [0.0, 1.0].
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Original bit depth before conversion (8 or 16)
    pub original_bit_depth: u8,
}

impl Frame {
    pub fn new(data: Array2<f32>, bit_depth: u8) -> Self {
        Self {
            data,
            original_bit_depth: bit_depth,
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Stretch a 16-bit frame whose sensor only fills the low `bits` bits
    /// (e.g. 12-bit cameras writing 16-bit TIFFs) to the full [0, 1] range.
    /// Other frames are left untouched.
    pub fn stretch_to_full_scale(&mut self, bits: u8) {
        if self.original_bit_depth != 16 || bits == 0 || bits >= 16 {
            return;
        }
        let scale = 65535.0 / ((1u32 << bits) - 1) as f32;
        self.data.mapv_inplace(|v| (v * scale).min(1.0));
    }
}

/// Two-level image: `true` marks filament pixels.
pub type Silhouette = Array2<bool>;

/// Per-frame minimum filament width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Diameter {
    /// Width in pixels.
    Pixels(f64),
    /// Filament separated, out of frame, or the frame could not be measured.
    Invalid,
}

impl Diameter {
    pub fn pixels(&self) -> Option<f64> {
        match self {
            Self::Pixels(px) => Some(*px),
            Self::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Pixels(_))
    }
}

/// Diameter measured on one frame of an experiment video.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameMeasurement {
    pub frame_index: usize,
    pub diameter: Diameter,
}
