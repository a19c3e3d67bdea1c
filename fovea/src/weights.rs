//! Region weight tables.
//!
//! Statistics grids are reweighted before reduction so that user focus
//! windows (or a default centre window) dominate the evidence. One table is
//! kept per grid shape; a zero `sum` marks the table as stale, and the next
//! reduction rebuilds it against the current windows and sensor crop.

use shared::geometry::Rectangle;

/// Most focus windows accepted from the application.
pub const MAX_WINDOWS: usize = 10;

/// Weight budget spread across all cells. A round number comfortably below
/// `1 << 16`, chosen so the per-cell quotient rounds cleanly when windows
/// are simple fractions of the image.
const WEIGHT_BUDGET: u32 = 46080;

/// Per-cell weights for one statistics grid shape.
#[derive(Debug, Clone, Default)]
pub struct RegionWeights {
    /// Grid rows the table was built for.
    pub rows: usize,
    /// Grid columns the table was built for.
    pub cols: usize,
    /// Row-major cell weights.
    pub w: Vec<u32>,
    /// Sum of all weights; zero means the table is stale.
    pub sum: u32,
}

impl RegionWeights {
    /// Create an empty table with space reserved for `capacity` cells.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            w: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Mark the table stale so the next use rebuilds it.
    pub fn invalidate(&mut self) {
        self.sum = 0;
    }

    /// Whether the table is usable for a `rows` x `cols` grid.
    pub fn matches(&self, rows: usize, cols: usize) -> bool {
        self.rows == rows && self.cols == cols && self.sum != 0
    }
}

/// Rebuild `wgts` for a `rows` x `cols` grid.
///
/// When windows are in use and the statistics region is at least one pixel
/// per cell, every window is merged in, weighted by the fraction of each
/// cell it covers (rounded up). Otherwise a default window covering the
/// middle half-width of the middle third-height gets weight one per cell.
/// Either way the resulting `sum` stays below `1 << 16`, which keeps the
/// 32-bit reduction accumulators safe.
pub fn compute_weights(
    wgts: &mut RegionWeights,
    rows: usize,
    cols: usize,
    stats_region: &Rectangle,
    windows: &[Rectangle],
    use_windows: bool,
) {
    wgts.rows = rows;
    wgts.cols = cols;
    wgts.sum = 0;
    wgts.w.clear();
    wgts.w.resize(rows * cols, 0);

    if rows > 0
        && cols > 0
        && use_windows
        && stats_region.height as usize >= rows
        && stats_region.width as usize >= cols
    {
        let max_cell_weight = WEIGHT_BUDGET / (MAX_WINDOWS as u32 * rows as u32 * cols as u32);
        let cell_w = stats_region.width / cols as u32;
        let cell_h = stats_region.height / rows as u32;
        let cell_area = u64::from(cell_w) * u64::from(cell_h);

        for win in windows {
            for r in 0..rows {
                for c in 0..cols {
                    let cell = Rectangle::new(
                        stats_region.x + (cell_w * c as u32) as i32,
                        stats_region.y + (cell_h * r as u32) as i32,
                        cell_w,
                        cell_h,
                    );
                    let Some(overlap) = cell.intersection(win) else {
                        continue;
                    };
                    let scaled = (u64::from(max_cell_weight) * overlap.area() + cell_area - 1)
                        / cell_area;
                    wgts.w[r * cols + c] += scaled as u32;
                    wgts.sum += scaled as u32;
                }
            }
        }
    }

    if wgts.sum == 0 {
        for r in rows / 3..rows - rows / 3 {
            for c in cols / 4..cols - cols / 4 {
                wgts.w[r * cols + c] = 1;
                wgts.sum += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Rectangle {
        Rectangle::new(0, 0, 1600, 1200)
    }

    #[test]
    fn test_default_centre_window() {
        let mut wgts = RegionWeights::default();
        compute_weights(&mut wgts, 12, 16, &region(), &[], false);
        // Middle 1/2 width of the middle 1/3 height: rows 4..8, cols 4..12.
        assert_eq!(wgts.sum, 4 * 8);
        assert_eq!(wgts.w[4 * 16 + 4], 1);
        assert_eq!(wgts.w[3 * 16 + 4], 0);
        assert_eq!(wgts.w[4 * 16 + 3], 0);
        assert_eq!(wgts.sum, wgts.w.iter().sum::<u32>());
    }

    #[test]
    fn test_full_frame_window_weights() {
        let mut wgts = RegionWeights::default();
        let win = [region()];
        compute_weights(&mut wgts, 12, 16, &region(), &win, true);
        // Every cell fully covered: weight budget / (10 * cells) each.
        let expect = 46080 / (10 * 12 * 16);
        assert!(wgts.w.iter().all(|&w| w == expect));
        assert_eq!(wgts.sum, expect * 12 * 16);
        assert!(wgts.sum < 1 << 16);
    }

    #[test]
    fn test_sum_bound_with_max_windows() {
        // Ten full-frame windows stack to exactly the weight budget.
        let mut wgts = RegionWeights::default();
        let wins = [region(); MAX_WINDOWS];
        compute_weights(&mut wgts, 12, 16, &region(), &wins, true);
        assert_eq!(wgts.sum, wgts.w.iter().sum::<u32>());
        assert!(wgts.sum < 1 << 16);
    }

    #[test]
    fn test_partial_window_rounds_up() {
        let mut wgts = RegionWeights::default();
        // A window covering one quarter of a single cell.
        let win = [Rectangle::new(0, 0, 50, 50)];
        compute_weights(&mut wgts, 12, 16, &region(), &win, true);
        // Cell is 100x100; quarter coverage of max weight 24 rounds to 6.
        assert_eq!(wgts.w[0], 6);
        assert_eq!(wgts.sum, 6);
    }

    #[test]
    fn test_small_region_falls_back_to_centre() {
        let mut wgts = RegionWeights::default();
        let tiny = Rectangle::new(0, 0, 8, 8);
        let win = [Rectangle::new(0, 0, 8, 8)];
        compute_weights(&mut wgts, 12, 16, &tiny, &win, true);
        // Region smaller than the grid: windows are unusable.
        assert_eq!(wgts.sum, 4 * 8);
    }

    #[test]
    fn test_invalidate_and_matches() {
        let mut wgts = RegionWeights::default();
        compute_weights(&mut wgts, 12, 16, &region(), &[], false);
        assert!(wgts.matches(12, 16));
        assert!(!wgts.matches(8, 8));
        wgts.invalidate();
        assert!(!wgts.matches(12, 16));
    }
}
