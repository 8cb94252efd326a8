//! LOESS: locally weighted linear smoothing.
//!
//! For a query `x` the smoother takes the `k = max(3, floor(bandwidth * n))`
//! nearest points by `|x - x_i|`, weights them with the tricube kernel
//! `(1 - u³)³` where `u = distance / max_neighbor_distance`, multiplies in any
//! per-point external weight, and evaluates a weighted linear fit at `x`.

use serde::{Deserialize, Serialize};

use super::regression::CurveModel;
use crate::models::{DataPoint, WeightedDataPoint};

/// Default neighbourhood fraction.
pub const DEFAULT_BANDWIDTH: f64 = 0.5;

const MIN_NEIGHBORS: usize = 3;
const DENOMINATOR_EPSILON: f64 = 1e-10;

/// Tricube kernel; zero at and beyond `u = 1`.
fn tricube(u: f64) -> f64 {
    let u = u.abs();
    if u >= 1.0 {
        0.0
    } else {
        let t = 1.0 - u * u * u;
        t * t * t
    }
}

/// A fitted LOESS smoother. Evaluation is lazy: every [`predict`] call fits
/// its own local line.
///
/// [`predict`]: LoessSmoother::predict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoessSmoother {
    points: Vec<WeightedDataPoint>,
    bandwidth: f64,
    neighbors: usize,
}

impl LoessSmoother {
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Number of neighbours used per local fit.
    pub fn neighbors(&self) -> usize {
        self.neighbors
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smoothed value at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        let mut by_distance: Vec<(f64, &WeightedDataPoint)> =
            self.points.iter().map(|p| ((p.x - x).abs(), p)).collect();
        by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));
        by_distance.truncate(self.neighbors);

        let max_distance = by_distance.last().map_or(0.0, |(d, _)| *d);

        let mut sum_w = 0.0;
        let mut sum_wx = 0.0;
        let mut sum_wy = 0.0;
        let mut sum_wxx = 0.0;
        let mut sum_wxy = 0.0;
        for (distance, point) in &by_distance {
            let kernel = if max_distance > 0.0 {
                tricube(distance / max_distance)
            } else {
                1.0
            };
            let w = kernel * point.weight;
            sum_w += w;
            sum_wx += w * point.x;
            sum_wy += w * point.y;
            sum_wxx += w * point.x * point.x;
            sum_wxy += w * point.x * point.y;
        }

        if sum_w <= 0.0 {
            let n = by_distance.len() as f64;
            return by_distance.iter().map(|(_, p)| p.y).sum::<f64>() / n;
        }

        let denominator = sum_w * sum_wxx - sum_wx * sum_wx;
        if denominator.abs() < DENOMINATOR_EPSILON {
            return sum_wy / sum_w;
        }

        let slope = (sum_w * sum_wxy - sum_wx * sum_wy) / denominator;
        let intercept = (sum_wy - slope * sum_wx) / sum_w;
        intercept + slope * x
    }
}

impl CurveModel for LoessSmoother {
    fn predict_at(&self, x: f64) -> Option<f64> {
        let y = self.predict(x);
        y.is_finite().then_some(y)
    }
}

/// Fit a smoother with uniform external weights.
///
/// Non-finite points are dropped; `None` when fewer than three remain.
///
/// # Examples
///
/// ```
/// use heatpump_analytics::algorithms::loess::loess_smooth;
/// use heatpump_analytics::models::DataPoint;
///
/// let points: Vec<DataPoint> = (0..20)
///     .map(|i| DataPoint::new(i as f64, 0.5 * i as f64))
///     .collect();
/// let smoother = loess_smooth(&points, 0.5).unwrap();
/// assert!((smoother.predict(7.0) - 3.5).abs() < 1e-9);
/// ```
pub fn loess_smooth(points: &[DataPoint], bandwidth: f64) -> Option<LoessSmoother> {
    let weighted: Vec<WeightedDataPoint> = points.iter().copied().map(Into::into).collect();
    loess_smooth_weighted(&weighted, bandwidth)
}

/// Fit a smoother whose points carry an external confidence weight.
///
/// Points with non-finite coordinates or a negative or non-finite weight are
/// dropped. A zero weight keeps the point in the neighbourhood without
/// letting it influence the fit.
pub fn loess_smooth_weighted(
    points: &[WeightedDataPoint],
    bandwidth: f64,
) -> Option<LoessSmoother> {
    let mut usable: Vec<WeightedDataPoint> = points
        .iter()
        .copied()
        .filter(|p| {
            p.x.is_finite() && p.y.is_finite() && p.weight.is_finite() && p.weight >= 0.0
        })
        .collect();

    if usable.len() < MIN_NEIGHBORS {
        log::debug!(
            "LOESS needs at least {} points, got {}",
            MIN_NEIGHBORS,
            usable.len()
        );
        return None;
    }

    usable.sort_by(|a, b| a.x.total_cmp(&b.x));

    let n = usable.len();
    // A NaN bandwidth floors to zero and falls back to the minimum.
    let from_bandwidth = (bandwidth * n as f64).floor() as usize;
    let neighbors = from_bandwidth.max(MIN_NEIGHBORS).min(n);

    Some(LoessSmoother {
        points: usable,
        bandwidth,
        neighbors,
    })
}
