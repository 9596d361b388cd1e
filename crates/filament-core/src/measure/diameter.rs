use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::binarize::otsu_threshold;
use crate::frame::{Diameter, Frame, Silhouette};

/// Rows excluded from the measurement at the top and bottom of a silhouette.
///
/// These bands cover the nozzle/needle and the substrate, which would
/// otherwise be mistaken for the thinning filament.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExclusionBands {
    /// Rows ignored from the top edge.
    #[serde(default)]
    pub top: usize,
    /// Rows ignored from the bottom edge.
    #[serde(default)]
    pub bottom: usize,
    /// Also ignore everything from the detected substrate row downwards.
    #[serde(default)]
    pub auto_bottom: bool,
    /// Also ignore the rows covered by the nozzle in the background image.
    #[serde(default)]
    pub auto_top: bool,
}

impl ExclusionBands {
    /// Bands with the top band widened to at least `window_top` rows.
    pub fn with_window_top(&self, window_top: Option<usize>) -> Self {
        Self {
            top: window_top.map_or(self.top, |w| self.top.max(w)),
            ..self.clone()
        }
    }
}

/// Length of the longest contiguous run of `true` in `row`.
pub fn longest_run(row: ArrayView1<'_, bool>) -> usize {
    let mut best = 0;
    let mut current = 0;
    for &px in row.iter() {
        if px {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Index of the substrate row: the row with the most filament pixels in the
/// lower half of the silhouette. Ties resolve to the upper-most row.
pub fn bottom_border(mask: &Silhouette) -> usize {
    let h = mask.nrows();
    let half = h / 2;
    let mut best_row = half;
    let mut best_count = 0;
    for (offset, row) in mask.rows().into_iter().skip(half).enumerate() {
        let count = row.iter().filter(|&&px| px).count();
        if count > best_count {
            best_count = count;
            best_row = half + offset;
        }
    }
    best_row
}

/// First row below the nozzle in a background image.
///
/// Rows holding any pixel darker than the image's Otsu threshold are nozzle
/// rows; the result is the row just past the first block of them. `None`
/// when no row is dark or the block reaches the bottom edge.
pub fn top_border(background: &Frame) -> Option<usize> {
    let threshold = otsu_threshold(&background.data);
    let dark = |r: usize| background.data.row(r).iter().any(|&v| v < threshold);
    let h = background.height();
    let start = (0..h).find(|&r| dark(r))?;
    (start..h).find(|&r| !dark(r))
}

/// Minimum filament width of a silhouette, in pixels.
///
/// Each retained row contributes the length of its longest run, so satellite
/// droplets beside the filament are ignored. Empty rows are skipped; when
/// every retained row is empty the filament has separated and the result is
/// `Diameter::Invalid`, never zero.
pub fn measure_diameter(mask: &Silhouette, bands: &ExclusionBands) -> Diameter {
    let h = mask.nrows();
    let mut end = h.saturating_sub(bands.bottom);
    if bands.auto_bottom {
        end = end.min(bottom_border(mask));
    }
    let start = bands.top.min(end);

    (start..end)
        .map(|r| longest_run(mask.row(r)))
        .filter(|&run| run > 0)
        .min()
        .map(|px| Diameter::Pixels(px as f64))
        .unwrap_or(Diameter::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array2};

    #[test]
    fn longest_run_picks_widest_segment() {
        let row = arr1(&[true, false, true, true, true, false, true, true]);
        assert_eq!(longest_run(row.view()), 3);
    }

    #[test]
    fn bottom_border_finds_widest_lower_row() {
        let mut mask = Array2::from_elem((10, 8), false);
        for r in 0..10 {
            mask[[r, 3]] = true;
        }
        for c in 0..8 {
            mask[[7, c]] = true;
        }
        assert_eq!(bottom_border(&mask), 7);
    }

    #[test]
    fn auto_bottom_excludes_substrate() {
        let mut mask = Array2::from_elem((10, 8), false);
        for r in 0..10 {
            mask[[r, 3]] = true;
            mask[[r, 4]] = true;
        }
        for r in 8..10 {
            for c in 0..8 {
                mask[[r, c]] = true;
            }
        }
        let bands = ExclusionBands {
            auto_bottom: true,
            ..Default::default()
        };
        assert_eq!(measure_diameter(&mask, &bands), Diameter::Pixels(2.0));
    }

    #[test]
    fn top_border_is_row_after_nozzle() {
        let mut data = Array2::from_elem((12, 10), 0.8f32);
        for r in 0..4 {
            for c in 3..7 {
                data[[r, c]] = 0.2;
            }
        }
        // A second dark block lower down is not the nozzle.
        data[[9, 5]] = 0.2;
        assert_eq!(top_border(&Frame::new(data, 8)), Some(4));
    }

    #[test]
    fn flat_background_has_no_top_border() {
        let data = Array2::from_elem((6, 6), 0.8f32);
        assert_eq!(top_border(&Frame::new(data, 8)), None);
    }

    #[test]
    fn window_top_only_widens_band() {
        let bands = ExclusionBands {
            top: 5,
            ..Default::default()
        };
        assert_eq!(bands.with_window_top(Some(3)).top, 5);
        assert_eq!(bands.with_window_top(Some(8)).top, 8);
        assert_eq!(bands.with_window_top(None).top, 5);
    }

    #[test]
    fn bands_covering_all_rows_are_invalid() {
        let mask = Array2::from_elem((4, 4), true);
        let bands = ExclusionBands {
            top: 3,
            bottom: 2,
            ..Default::default()
        };
        assert_eq!(measure_diameter(&mask, &bands), Diameter::Invalid);
    }
}
