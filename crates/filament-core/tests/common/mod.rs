use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};

/// Background brightness of synthetic frames (8-bit).
pub const BACKGROUND_LEVEL: u8 = 204;
/// Filament brightness of synthetic frames (8-bit).
pub const FILAMENT_LEVEL: u8 = 51;

pub const FRAME_WIDTH: u32 = 80;
pub const FRAME_HEIGHT: u32 = 40;

/// Flat bright frame with a dark vertical filament `width` pixels wide,
/// centred horizontally and spanning every row.
pub fn filament_frame(width: u32) -> GrayImage {
    let left = (FRAME_WIDTH - width) / 2;
    GrayImage::from_fn(FRAME_WIDTH, FRAME_HEIGHT, |x, _| {
        if width > 0 && x >= left && x < left + width {
            Luma([FILAMENT_LEVEL])
        } else {
            Luma([BACKGROUND_LEVEL])
        }
    })
}

/// Rows covered by the nozzle in `nozzle_frame`.
pub const NOZZLE_ROWS: u32 = 6;

/// `filament_frame` with a dark nozzle `nozzle_width` pixels wide over the
/// top `NOZZLE_ROWS` rows.
pub fn nozzle_frame(width: u32, nozzle_width: u32) -> GrayImage {
    let mut img = filament_frame(width);
    let left = (FRAME_WIDTH - nozzle_width) / 2;
    for y in 0..NOZZLE_ROWS {
        for x in left..left + nozzle_width {
            img.put_pixel(x, y, Luma([FILAMENT_LEVEL]));
        }
    }
    img
}

/// Write one frame per entry of `widths` as `NNN.png` into `dir`.
pub fn write_video(dir: &Path, widths: &[u32]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    for (i, &w) in widths.iter().enumerate() {
        filament_frame(w)
            .save(dir.join(format!("{i:03}.png")))
            .unwrap();
    }
    dir.to_path_buf()
}

/// Write a background video of `count` empty frames.
pub fn write_background(dir: &Path, count: usize) -> PathBuf {
    write_video(dir, &vec![0; count])
}

/// Folder name of a synthetic video using the default name format.
pub fn video_name(sample: &str, run: u32, vtype: &str) -> String {
    format!("20240101_{sample}_fps-25k_{run}_{vtype}")
}

/// Experiment and matching background folders for one pair under `root`.
pub fn write_pair(root: &Path, sample: &str, run: u32, widths: &[u32]) {
    write_video(&root.join(video_name(sample, run, "exp")), widths);
    write_background(&root.join(video_name(sample, run, "bg")), 3);
}

/// Experiment and background of one pair filmed below a nozzle. The nozzle
/// looks wider in the experiment, as when liquid wets its tip.
pub fn write_nozzle_pair(root: &Path, sample: &str, run: u32, widths: &[u32]) {
    let exp = root.join(video_name(sample, run, "exp"));
    std::fs::create_dir_all(&exp).unwrap();
    for (i, &w) in widths.iter().enumerate() {
        nozzle_frame(w, 24).save(exp.join(format!("{i:03}.png"))).unwrap();
    }
    let bg = root.join(video_name(sample, run, "bg"));
    std::fs::create_dir_all(&bg).unwrap();
    for i in 0..3 {
        nozzle_frame(0, 20).save(bg.join(format!("{i:03}.png"))).unwrap();
    }
}

/// Pixel widths of a decay whose silhouette jitters by one pixel.
pub fn jittered_widths() -> Vec<u32> {
    vec![50, 46, 47, 42, 38, 39, 34, 31, 32, 28, 25, 26, 23, 21, 22, 19]
}

/// Filament widths (px) of a decay sampled every frame at 25 kfps.
pub fn decaying_widths() -> Vec<u32> {
    vec![50, 45, 40, 36, 32, 29, 26, 23, 21, 19]
}
