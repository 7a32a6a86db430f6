//! Greedy clump-window selection over the density curve.
//!
//! Long-tail history is thinned by covering it with disjoint windows of
//! 5-10 days, each later represented by a single kept snapshot. Windows are
//! chosen greedily from the earliest unclaimed hour, maximizing the integral
//! of the density curve; a 12h guard band on both sides keeps neighbouring
//! windows from touching.
//!
//! Claimed hours live in an explicit range set with a next-unclaimed lookup
//! rather than a mutable boolean array, so the scan cannot alias indices it
//! has already consumed.

use chrono::{DateTime, Utc};

use super::smooth::DensityGrid;

/// Hours masked on each side of a selected window.
pub const GUARD_HOURS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// first grid hour inside the window
    pub start: DateTime<Utc>,
    /// last grid hour inside the window (inclusive)
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct WindowParams {
    pub min_days: i64,
    pub max_days: i64,
    /// smallest acceptable density integral for a candidate window
    pub min_area: f64,
}

impl Default for WindowParams {
    fn default() -> Self {
        WindowParams {
            min_days: 5,
            max_days: 10,
            min_area: 0.0,
        }
    }
}

/// Sorted, disjoint set of half-open claimed index ranges.
#[derive(Debug, Default)]
struct ClaimedRanges {
    ranges: Vec<(usize, usize)>,
}

impl ClaimedRanges {
    fn claim(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        self.ranges.push((start, end));
        self.ranges.sort_unstable_by_key(|r| r.0);

        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(self.ranges.len());
        for &(s, e) in &self.ranges {
            match merged.last_mut() {
                Some(last) if s <= last.1 => last.1 = last.1.max(e),
                _ => merged.push((s, e)),
            }
        }
        self.ranges = merged;
    }

    /// Smallest index in [0, len) not covered by any claimed range.
    fn next_unclaimed(&self, len: usize) -> Option<usize> {
        let mut candidate = 0;
        for &(start, end) in &self.ranges {
            if candidate < start {
                break;
            }
            candidate = candidate.max(end);
        }
        (candidate < len).then_some(candidate)
    }
}

/// Select disjoint maximal-integral windows over the grid.
///
/// From each earliest unclaimed hour, every window length between
/// `min_days` and `max_days` (inclusive) that fits the grid is evaluated;
/// the largest integral wins and exact ties go to the shortest length, so
/// more windows fit in total. Starts where no candidate reaches `min_area`
/// are skipped hour by hour.
pub fn select_windows(grid: &DensityGrid, params: &WindowParams) -> Vec<Window> {
    let len = grid.len();
    if len == 0 {
        return Vec::new();
    }

    let hmin = ((params.min_days * 24).max(1)) as usize;
    let hmax = (params.max_days * 24) as usize;

    // prefix sums make each candidate integral O(1)
    let mut prefix = vec![0.0f64; len + 1];
    for (i, point) in grid.points.iter().enumerate() {
        prefix[i + 1] = prefix[i] + point.density;
    }
    let area = |i: usize, j: usize| prefix[j] - prefix[i];

    let mut claimed = ClaimedRanges::default();
    let mut selected = Vec::new();

    while let Some(i0) = claimed.next_unclaimed(len) {
        // shortest length wins exact ties: a longer candidate must beat
        // the incumbent strictly
        let mut best: Option<(usize, f64)> = None;
        for length in hmin..=hmax {
            let j = i0 + length;
            if j > len {
                break;
            }
            let candidate = area(i0, j);
            if candidate >= params.min_area {
                match best {
                    Some((_, incumbent)) if candidate <= incumbent => {}
                    _ => best = Some((j, candidate)),
                }
            }
        }

        let Some((j, _)) = best else {
            // nothing acceptable starts here
            claimed.claim(i0, i0 + 1);
            continue;
        };

        selected.push(Window {
            start: grid.points[i0].hour,
            end: grid.points[j - 1].hour,
        });
        claimed.claim(i0.saturating_sub(GUARD_HOURS), (j + GUARD_HOURS).min(len));
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::smooth::GridPoint;
    use chrono::{Duration, TimeZone};

    fn grid_from(densities: &[f64]) -> DensityGrid {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        DensityGrid {
            points: densities
                .iter()
                .enumerate()
                .map(|(i, &density)| GridPoint {
                    hour: start + Duration::hours(i as i64),
                    density,
                })
                .collect(),
        }
    }

    fn window_hours(w: &Window) -> i64 {
        (w.end - w.start).num_hours() + 1
    }

    #[test]
    fn empty_grid_no_windows() {
        let grid = DensityGrid::default();
        assert!(select_windows(&grid, &WindowParams::default()).is_empty());
    }

    #[test]
    fn grid_shorter_than_min_length_no_windows() {
        let grid = grid_from(&vec![1.0; 24]);
        assert!(select_windows(&grid, &WindowParams::default()).is_empty());
    }

    #[test]
    fn window_lengths_stay_within_bounds() {
        let grid = grid_from(&vec![0.3; 40 * 24]);
        let params = WindowParams::default();
        let windows = select_windows(&grid, &params);

        assert!(!windows.is_empty());
        for w in &windows {
            let hours = window_hours(w);
            assert!(
                hours >= params.min_days * 24 && hours <= params.max_days * 24,
                "window of {hours}h violates bounds"
            );
        }
    }

    #[test]
    fn windows_respect_guard_bands() {
        let grid = grid_from(&vec![0.3; 60 * 24]);
        let windows = select_windows(&grid, &WindowParams::default());
        assert!(windows.len() >= 2);

        for pair in windows.windows(2) {
            let gap = (pair[1].start - pair[0].end).num_hours();
            assert!(
                gap > GUARD_HOURS as i64,
                "windows separated by only {gap}h"
            );
        }
    }

    #[test]
    fn uniform_positive_density_prefers_longest_window() {
        // every extra hour adds area, so the first window maxes out
        let grid = grid_from(&vec![1.0; 20 * 24]);
        let windows = select_windows(&grid, &WindowParams::default());
        assert_eq!(window_hours(&windows[0]), 10 * 24);
    }

    #[test]
    fn exact_ties_go_to_the_shortest_length() {
        // positive density for exactly min_days, zero afterwards: every
        // longer candidate has the same integral, shortest must win
        let mut densities = vec![1.0; 2 * 24];
        densities.extend(vec![0.0; 8 * 24]);
        let grid = grid_from(&densities);

        let params = WindowParams {
            min_days: 2,
            max_days: 4,
            min_area: 0.1,
        };
        let windows = select_windows(&grid, &params);
        assert_eq!(window_hours(&windows[0]), 2 * 24);
    }

    #[test]
    fn starts_below_min_area_are_skipped() {
        // dead zone first, activity later: the selector must skip dead
        // hours one by one until a 48h candidate reaches the minimum area
        let mut densities = vec![0.0; 3 * 24];
        densities.extend(vec![2.0; 8 * 24]);
        let grid = grid_from(&densities);

        let params = WindowParams {
            min_days: 2,
            max_days: 2,
            min_area: 10.0,
        };
        let windows = select_windows(&grid, &params);
        assert!(!windows.is_empty());
        // a window starting at hour i covers (i + 48 - 72) active hours of
        // density 2.0; the first start reaching area 10 is hour 29
        assert_eq!(windows[0].start, grid.points[29].hour);
        assert_eq!(window_hours(&windows[0]), 2 * 24);
    }

    #[test]
    fn all_zero_grid_with_min_area_yields_nothing() {
        let grid = grid_from(&vec![0.0; 15 * 24]);
        let params = WindowParams {
            min_area: 0.5,
            ..WindowParams::default()
        };
        assert!(select_windows(&grid, &params).is_empty());
    }

    #[test]
    fn claimed_ranges_merge_and_report_next_unclaimed() {
        let mut claimed = ClaimedRanges::default();
        assert_eq!(claimed.next_unclaimed(10), Some(0));

        claimed.claim(0, 3);
        claimed.claim(5, 7);
        assert_eq!(claimed.next_unclaimed(10), Some(3));

        claimed.claim(3, 5);
        assert_eq!(claimed.next_unclaimed(10), Some(7));
        assert_eq!(claimed.ranges.len(), 1);

        claimed.claim(7, 10);
        assert_eq!(claimed.next_unclaimed(10), None);
    }
}
