//! Linear regression: ordinary, weighted and robust (IRLS with Huber weights).
//!
//! All fits are closed-form over `(x, y)` sums. Degenerate inputs never
//! produce `NaN` or infinities:
//!
//! - zero variance in `x` gives a flat line through the (weighted) mean of `y`
//! - zero total weight falls back to the unweighted mean
//! - fewer than two usable points gives `None` from the public entry points

use serde::{Deserialize, Serialize};

use crate::models::DataPoint;

/// Variance and weight sums at or below this are treated as zero.
const DEGENERATE_EPSILON: f64 = 1e-12;

/// A fitted straight line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fitted line plus goodness-of-fit figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    /// `1 - SSres/SStot`, or `0.0` when all `y` are equal.
    pub r_squared: f64,
    pub sample_size: usize,
    pub mean_absolute_error: f64,
}

impl RegressionResult {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    pub fn line(&self) -> LinearFit {
        LinearFit {
            slope: self.slope,
            intercept: self.intercept,
        }
    }
}

/// A fitted model that can be sampled into a display curve.
pub trait CurveModel {
    /// Model value at `x`, or `None` where the model is undefined.
    fn predict_at(&self, x: f64) -> Option<f64>;
}

impl CurveModel for LinearFit {
    fn predict_at(&self, x: f64) -> Option<f64> {
        let y = self.predict(x);
        y.is_finite().then_some(y)
    }
}

impl CurveModel for RegressionResult {
    fn predict_at(&self, x: f64) -> Option<f64> {
        let y = self.predict(x);
        y.is_finite().then_some(y)
    }
}

/// IRLS parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobustRegressionOptions {
    pub max_iterations: usize,
    /// Stop once `|Δslope| + |Δintercept|` drops below this.
    pub tolerance: f64,
    /// Huber threshold as a multiple of the median absolute residual.
    pub huber_k: f64,
}

impl Default for RobustRegressionOptions {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 1e-4,
            huber_k: 1.5,
        }
    }
}

/// Median of `values`, averaging the two middle elements on an even count.
///
/// Returns `None` for an empty slice. Non-finite values sort by
/// `f64::total_cmp` and should be filtered by the caller.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Unweighted least squares. `None` only for an empty slice.
pub fn ordinary_least_squares(points: &[DataPoint]) -> Option<LinearFit> {
    if points.is_empty() {
        return None;
    }
    let weights = vec![1.0; points.len()];
    weighted_least_squares(points, &weights)
}

/// Weighted least squares over `points` with the paired `weights`.
///
/// Negative or non-finite weights count as zero. Returns `None` for an empty
/// slice or when the two slices differ in length.
pub fn weighted_least_squares(points: &[DataPoint], weights: &[f64]) -> Option<LinearFit> {
    if points.is_empty() || points.len() != weights.len() {
        return None;
    }

    let mut sum_w = 0.0;
    let mut sum_wx = 0.0;
    let mut sum_wy = 0.0;
    for (point, &raw) in points.iter().zip(weights) {
        let w = sanitize_weight(raw);
        sum_w += w;
        sum_wx += w * point.x;
        sum_wy += w * point.y;
    }

    if sum_w <= DEGENERATE_EPSILON {
        let mean_y = points.iter().map(|p| p.y).sum::<f64>() / points.len() as f64;
        return Some(LinearFit {
            slope: 0.0,
            intercept: mean_y,
        });
    }

    let mean_x = sum_wx / sum_w;
    let mean_y = sum_wy / sum_w;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (point, &raw) in points.iter().zip(weights) {
        let w = sanitize_weight(raw);
        let dx = point.x - mean_x;
        sxx += w * dx * dx;
        sxy += w * dx * (point.y - mean_y);
    }

    if sxx <= DEGENERATE_EPSILON {
        return Some(LinearFit {
            slope: 0.0,
            intercept: mean_y,
        });
    }

    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

fn finite_points(points: &[DataPoint]) -> Vec<DataPoint> {
    points.iter().copied().filter(DataPoint::is_finite).collect()
}

/// Score a fitted line against the points it was fitted to.
fn evaluate_fit(points: &[DataPoint], fit: LinearFit) -> RegressionResult {
    let n = points.len() as f64;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    let mut abs_err = 0.0;
    for point in points {
        let residual = point.y - fit.predict(point.x);
        ss_res += residual * residual;
        abs_err += residual.abs();
        let dev = point.y - mean_y;
        ss_tot += dev * dev;
    }

    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    RegressionResult {
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared,
        sample_size: points.len(),
        mean_absolute_error: abs_err / n,
    }
}

/// Plain OLS wrapped in a [`RegressionResult`].
///
/// Non-finite points are dropped; `None` for fewer than two remaining.
pub fn linear_regression(points: &[DataPoint]) -> Option<RegressionResult> {
    let points = finite_points(points);
    if points.len() < 2 {
        return None;
    }
    let fit = ordinary_least_squares(&points)?;
    Some(evaluate_fit(&points, fit))
}

/// Outlier-resistant line fit by iteratively reweighted least squares.
///
/// Starts from OLS. Each iteration computes the median absolute residual
/// (MAD), sets the Huber threshold `c = huber_k * MAD`, weights every point
/// `1` when `|r| <= c` and `c / |r|` otherwise, and refits by weighted least
/// squares. Outliers are down-weighted but never removed.
///
/// Iteration ends after `max_iterations`, when the coefficients move less
/// than `tolerance`, or when MAD reaches zero (the majority of points already
/// lie on the line).
///
/// Non-finite points are dropped; returns `None` for fewer than two
/// remaining.
///
/// # Examples
///
/// ```
/// use heatpump_analytics::algorithms::regression::{
///     robust_linear_regression, RobustRegressionOptions,
/// };
/// use heatpump_analytics::models::DataPoint;
///
/// let points: Vec<DataPoint> = (0..10)
///     .map(|i| DataPoint::new(i as f64, 2.0 * i as f64 + 1.0))
///     .collect();
/// let fit = robust_linear_regression(&points, &RobustRegressionOptions::default()).unwrap();
/// assert!((fit.slope - 2.0).abs() < 1e-9);
/// assert!((fit.r_squared - 1.0).abs() < 1e-9);
/// ```
pub fn robust_linear_regression(
    points: &[DataPoint],
    options: &RobustRegressionOptions,
) -> Option<RegressionResult> {
    let points = finite_points(points);
    if points.len() < 2 {
        return None;
    }

    let mut fit = ordinary_least_squares(&points)?;
    let mut weights = vec![1.0; points.len()];
    let mut iterations = 0;

    for _ in 0..options.max_iterations {
        let residuals: Vec<f64> = points.iter().map(|p| p.y - fit.predict(p.x)).collect();
        let abs_residuals: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
        let mad = median(&abs_residuals).unwrap_or(0.0);
        if mad <= f64::EPSILON {
            break;
        }

        let threshold = options.huber_k * mad;
        for (weight, residual) in weights.iter_mut().zip(&residuals) {
            let abs = residual.abs();
            *weight = if abs <= threshold { 1.0 } else { threshold / abs };
        }

        let next = weighted_least_squares(&points, &weights)?;
        let change = (next.slope - fit.slope).abs() + (next.intercept - fit.intercept).abs();
        fit = next;
        iterations += 1;

        if change < options.tolerance {
            break;
        }
    }

    log::trace!(
        "Robust regression over {} points converged after {} iterations (slope {:.4})",
        points.len(),
        iterations,
        fit.slope
    );

    Some(evaluate_fit(&points, fit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, slope: f64, intercept: f64) -> Vec<DataPoint> {
        (0..n)
            .map(|i| DataPoint::new(i as f64, intercept + slope * i as f64))
            .collect()
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0]), Some(3.0));
        assert_eq!(median(&[4.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_ols_exact_line() {
        let fit = ordinary_least_squares(&line(5, 3.0, 2.0)).unwrap();
        assert!((fit.slope - 3.0).abs() < 1e-10);
        assert!((fit.intercept - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_ols_zero_x_variance() {
        let points = vec![
            DataPoint::new(5.0, 1.0),
            DataPoint::new(5.0, 2.0),
            DataPoint::new(5.0, 6.0),
        ];
        let fit = ordinary_least_squares(&points).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_wls_weighted_mean_fallback() {
        let points = vec![DataPoint::new(1.0, 2.0), DataPoint::new(1.0, 4.0)];
        let fit = weighted_least_squares(&points, &[3.0, 1.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_wls_zero_total_weight() {
        let points = vec![DataPoint::new(0.0, 2.0), DataPoint::new(1.0, 4.0)];
        let fit = weighted_least_squares(&points, &[0.0, f64::NAN]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_wls_mismatched_lengths() {
        assert!(weighted_least_squares(&line(3, 1.0, 0.0), &[1.0, 1.0]).is_none());
        assert!(weighted_least_squares(&[], &[]).is_none());
    }

    #[test]
    fn test_robust_requires_two_points() {
        let options = RobustRegressionOptions::default();
        assert!(robust_linear_regression(&[], &options).is_none());
        assert!(robust_linear_regression(&[DataPoint::new(1.0, 2.0)], &options).is_none());
        assert!(robust_linear_regression(
            &[DataPoint::new(1.0, 2.0), DataPoint::new(f64::NAN, 3.0)],
            &options
        )
        .is_none());
    }

    #[test]
    fn test_robust_collinear_points() {
        let result =
            robust_linear_regression(&line(8, -0.5, 4.0), &RobustRegressionOptions::default())
                .unwrap();
        assert!((result.slope + 0.5).abs() < 1e-9);
        assert!((result.intercept - 4.0).abs() < 1e-9);
        assert!((result.r_squared - 1.0).abs() < 1e-9);
        assert!(result.mean_absolute_error < 1e-9);
        assert_eq!(result.sample_size, 8);
    }

    #[test]
    fn test_robust_resists_outlier() {
        let mut points = line(10, 2.0, 1.0);
        points.push(DataPoint::new(5.0, 50.0));

        let ols = linear_regression(&points).unwrap();
        let robust = robust_linear_regression(&points, &RobustRegressionOptions::default()).unwrap();

        assert!((robust.predict(5.0) - 11.0).abs() < 0.1);
        assert!((robust.slope - 2.0).abs() < 0.05);
        assert!((ols.predict(5.0) - 11.0).abs() > 2.0);
        assert!(robust.mean_absolute_error < ols.mean_absolute_error);
    }

    #[test]
    fn test_constant_y_r_squared_zero() {
        let points = vec![
            DataPoint::new(0.0, 3.0),
            DataPoint::new(1.0, 3.0),
            DataPoint::new(2.0, 3.0),
        ];
        let result = robust_linear_regression(&points, &RobustRegressionOptions::default()).unwrap();
        assert_eq!(result.r_squared, 0.0);
        assert_eq!(result.slope, 0.0);
        assert!(!result.r_squared.is_nan());
    }

    #[test]
    fn test_zero_iterations_is_ols() {
        let mut points = line(6, 1.0, 0.0);
        points.push(DataPoint::new(3.0, 30.0));
        let options = RobustRegressionOptions {
            max_iterations: 0,
            ..Default::default()
        };
        let robust = robust_linear_regression(&points, &options).unwrap();
        let ols = linear_regression(&points).unwrap();
        assert_eq!(robust, ols);
    }

    #[test]
    fn test_curve_model_for_result() {
        let result = linear_regression(&line(4, 1.5, -1.0)).unwrap();
        assert!((result.predict_at(2.0).unwrap() - 2.0).abs() < 1e-10);
        assert_eq!(result.line().predict_at(f64::INFINITY), None);
    }
}
