//! Robust percentile scaling of raw feature deltas.
//!
//! Raw deltas (changed lines, changed store paths) have wildly different
//! magnitudes across machines, so each feature is scaled to [0,1] against
//! its own observed distribution:
//! - p5/p95 nearest-rank percentiles anchor the scale
//! - values outside the anchors clamp to 0.0 / 1.0
//! - a degenerate distribution (p95 == p5) maps to a 0/1 step

use std::collections::HashMap;

/// Map every raw value in `values` to a normalized score in [0,1].
///
/// The result is keyed by raw value, so identical inputs always normalize
/// identically. An empty input yields an empty map; a singleton maps to 0.0
/// since one observation carries no spread.
pub fn percentile_scale(values: &[u64]) -> HashMap<u64, f64> {
    if values.is_empty() {
        return HashMap::new();
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    if sorted.len() == 1 {
        return HashMap::from([(sorted[0], 0.0)]);
    }

    // nearest-rank percentiles, 0-indexed
    let n = sorted.len();
    let p5 = sorted[(0.05 * (n - 1) as f64) as usize] as f64;
    let p95 = sorted[(0.95 * (n - 1) as f64) as usize] as f64;

    let mut scaled = HashMap::new();
    for &value in values {
        let v = value as f64;
        let norm = if p95 == p5 {
            // no spread between the anchors: step function at p5
            if v <= p5 { 0.0 } else { 1.0 }
        } else {
            ((v - p5) / (p95 - p5)).clamp(0.0, 1.0)
        };
        scaled.insert(value, norm);
    }

    scaled
}
