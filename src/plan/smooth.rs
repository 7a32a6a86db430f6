//! Gaussian kernel smoothing of activity over time.
//!
//! Turns discrete (timestamp, score) points into an hourly density curve
//! spanning the whole observed history. The curve feeds only the long-range
//! clumping tier; it is recomputed every run and never persisted.

use chrono::{DateTime, Duration, Utc};

use crate::util::floor_hour;

pub const DEFAULT_SIGMA_HOURS: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub hour: DateTime<Utc>,
    pub density: f64,
}

/// Hourly activity density over [floor-hour(first), floor-hour(last)].
#[derive(Debug, Clone, Default)]
pub struct DensityGrid {
    pub points: Vec<GridPoint>,
}

impl DensityGrid {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The grid restricted to hours at or before `cutoff`.
    pub fn up_to(&self, cutoff: DateTime<Utc>) -> DensityGrid {
        DensityGrid {
            points: self
                .points
                .iter()
                .take_while(|p| p.hour <= cutoff)
                .copied()
                .collect(),
        }
    }
}

/// Kernel-regress `points` (chronological) onto an hourly grid.
///
/// density(t) = Σ score · exp(−Δh²/(2σ²)) with Δh measured in fractional
/// hours against the un-floored point timestamps. Empty input yields an
/// empty grid. The O(points × hours) double loop is fine at the scales this
/// engine sees (hundreds of snapshots over a few thousand hours).
pub fn kernel_smooth(points: &[(DateTime<Utc>, f64)], sigma_hours: f64) -> DensityGrid {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return DensityGrid::default();
    };

    let start = floor_hour(first.0);
    let end = floor_hour(last.0);
    let hours = (end - start).num_hours() + 1;
    let denom = 2.0 * sigma_hours * sigma_hours;

    let mut grid = Vec::with_capacity(hours as usize);
    for i in 0..hours {
        let hour = start + Duration::hours(i);
        let mut density = 0.0;
        for (ts, score) in points {
            let dh = (*ts - hour).num_seconds().abs() as f64 / 3600.0;
            density += score * (-(dh * dh) / denom).exp();
        }
        grid.push(GridPoint { hour, density });
    }

    DensityGrid { points: grid }
}
