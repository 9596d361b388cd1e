use std::path::{Path, PathBuf};

use crate::consts::{BG_SUB_DIR, BINARY_DIR, CROP_DIR};
use crate::error::Result;

use super::config::SaveConfig;

/// Output locations of one video pair, disjoint from every other pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub binary_dir: PathBuf,
    pub crop_dir: PathBuf,
    pub bg_sub_dir: PathBuf,
    pub series_csv: PathBuf,
    pub summary_csv: PathBuf,
    pub params_csv: PathBuf,
}

impl ArtifactPaths {
    pub fn new(output: &Path, name: &str) -> Self {
        let dir = output.join(name);
        Self {
            binary_dir: dir.join(BINARY_DIR),
            crop_dir: dir.join(CROP_DIR),
            bg_sub_dir: dir.join(BG_SUB_DIR),
            series_csv: dir.join(format!("{name}_series.csv")),
            summary_csv: dir.join(format!("{name}_summary.csv")),
            params_csv: dir.join(format!("{name}_params.csv")),
            dir,
        }
    }

    /// Create the folders the enabled outputs are written to.
    pub fn create_dirs(&self, save: &SaveConfig) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        if save.binary {
            std::fs::create_dir_all(&self.binary_dir)?;
        }
        if save.crop {
            std::fs::create_dir_all(&self.crop_dir)?;
        }
        if save.bg_sub {
            std::fs::create_dir_all(&self.bg_sub_dir)?;
        }
        Ok(())
    }

    /// File name of frame `index` inside an image folder.
    pub fn frame_file(dir: &Path, index: usize, extension: &str) -> PathBuf {
        dir.join(format!("{index:03}.{extension}"))
    }
}

/// Whether a pair's results are already on disk and can be skipped.
pub fn outputs_exist(paths: &ArtifactPaths) -> bool {
    paths.series_csv.is_file() && paths.summary_csv.is_file()
}
