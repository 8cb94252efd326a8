//! Numeric fitting algorithms.
//!
//! # Components
//!
//! - [`regression`]: Ordinary, weighted and robust (IRLS/Huber) line fits
//! - [`loess`]: Local weighted linear smoothing with tricube weights
//!
//! Both fitted model types implement [`CurveModel`], so display curves are
//! sampled the same way for either.

pub mod loess;
pub mod regression;

pub use loess::{loess_smooth, loess_smooth_weighted, LoessSmoother, DEFAULT_BANDWIDTH};
pub use regression::{
    linear_regression, median, ordinary_least_squares, robust_linear_regression,
    weighted_least_squares, CurveModel, LinearFit, RegressionResult, RobustRegressionOptions,
};
