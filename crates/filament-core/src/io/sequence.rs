use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::FRAME_EXTENSIONS;
use crate::error::{FilamentError, Result};
use crate::frame::Frame;
use crate::io::image_io::load_image;

/// A video stored as a folder of numbered still images.
///
/// Frames are ordered by file name and decoded on demand, so a sequence of
/// thousands of high-speed frames never has to be resident at once.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    root: PathBuf,
    paths: Vec<PathBuf>,
    sensor_bits: Option<u8>,
}

impl FrameSequence {
    /// List the frames in `dir`. A missing folder is `MissingInput`; an
    /// existing folder without frames opens as an empty sequence.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(FilamentError::MissingInput(format!(
                "video folder {} not found",
                dir.display()
            )));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_frame_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        debug!(folder = %dir.display(), frames = paths.len(), "Opened frame sequence");

        Ok(Self {
            root: dir.to_path_buf(),
            paths,
            sensor_bits: None,
        })
    }

    /// Stretch 16-bit frames holding `bits`-bit sensor data to full scale
    /// when they are decoded.
    pub fn with_sensor_bits(mut self, bits: Option<u8>) -> Self {
        self.sensor_bits = bits;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn frame_count(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Decode frame `index`. Any decode failure is reported as `CorruptFrame`.
    pub fn read_frame(&self, index: usize) -> Result<Frame> {
        let path = self
            .paths
            .get(index)
            .ok_or(FilamentError::FrameIndexOutOfRange {
                index,
                total: self.paths.len(),
            })?;
        let mut frame = load_image(path).map_err(|e| FilamentError::CorruptFrame {
            index,
            reason: e.to_string(),
        })?;
        if let Some(bits) = self.sensor_bits {
            frame.stretch_to_full_scale(bits);
        }
        Ok(frame)
    }

    /// Iterate over all frames in order.
    pub fn frames(&self) -> impl Iterator<Item = Result<Frame>> + '_ {
        (0..self.frame_count()).map(move |i| self.read_frame(i))
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
