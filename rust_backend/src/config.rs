//! Analytics configuration file support.
//!
//! Every tunable of the pipeline is an explicit function parameter. This
//! module only bundles sensible defaults and lets a presentation layer load
//! overrides from an `analytics.toml` file:
//!
//! ```toml
//! [quality]
//! max_cop = 7.5
//!
//! [histogram]
//! cop_bin_size = 0.25
//!
//! [loess]
//! bandwidth = 0.4
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::algorithms::regression::RobustRegressionOptions;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::services::distributions::AutoBinSizing;
use crate::services::trends::TrendOptions;
use crate::transformations::quality::CopRange;

/// Complete analytics configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub quality: QualitySettings,
    #[serde(default)]
    pub histogram: HistogramSettings,
    #[serde(default)]
    pub regression: RegressionSettings,
    #[serde(default)]
    pub loess: LoessSettings,
}

/// Realistic COP range used by the data quality filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySettings {
    #[serde(default = "default_min_cop")]
    pub min_cop: f64,
    #[serde(default = "default_max_cop")]
    pub max_cop: f64,
}

/// Histogram bin sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSettings {
    #[serde(default = "default_cop_bin_size")]
    pub cop_bin_size: f64,
    #[serde(default = "default_energy_target_bins")]
    pub energy_target_bins: usize,
    #[serde(default = "default_energy_bin_step")]
    pub energy_bin_step_kwh: f64,
    #[serde(default = "default_energy_bin_step")]
    pub min_energy_bin_size_kwh: f64,
}

/// Robust (IRLS/Huber) regression parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionSettings {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_huber_k")]
    pub huber_k: f64,
}

/// LOESS smoothing and curve sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoessSettings {
    #[serde(default = "default_bandwidth")]
    pub bandwidth: f64,
    #[serde(default = "default_curve_points")]
    pub curve_points: usize,
}

/// Where `from_default_location` looks, relative to the working directory.
fn default_search_paths() -> [PathBuf; 2] {
    [
        PathBuf::from("analytics.toml"),
        PathBuf::from("../analytics.toml"),
    ]
}

/// True for zero, negative and NaN values.
fn not_positive(value: f64) -> bool {
    value.is_nan() || value <= 0.0
}

fn default_min_cop() -> f64 {
    0.0
}

fn default_max_cop() -> f64 {
    8.0
}

fn default_cop_bin_size() -> f64 {
    0.5
}

fn default_energy_target_bins() -> usize {
    15
}

fn default_energy_bin_step() -> f64 {
    50.0
}

fn default_max_iterations() -> usize {
    10
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_huber_k() -> f64 {
    1.5
}

fn default_bandwidth() -> f64 {
    0.5
}

fn default_curve_points() -> usize {
    50
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            min_cop: default_min_cop(),
            max_cop: default_max_cop(),
        }
    }
}

impl Default for HistogramSettings {
    fn default() -> Self {
        Self {
            cop_bin_size: default_cop_bin_size(),
            energy_target_bins: default_energy_target_bins(),
            energy_bin_step_kwh: default_energy_bin_step(),
            min_energy_bin_size_kwh: default_energy_bin_step(),
        }
    }
}

impl Default for RegressionSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            huber_k: default_huber_k(),
        }
    }
}

impl Default for LoessSettings {
    fn default() -> Self {
        Self {
            bandwidth: default_bandwidth(),
            curve_points: default_curve_points(),
        }
    }
}

impl AnalyticsConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(AnalyticsConfig)` if the file exists, parses and validates
    /// * `Err(AnalyticsError)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> AnalyticsResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| AnalyticsError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_toml_str(&content)?;
        log::debug!("Loaded analytics configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> AnalyticsResult<Self> {
        let config: AnalyticsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `analytics.toml` in:
    /// 1. Current directory
    /// 2. Parent directory
    pub fn from_default_location() -> AnalyticsResult<Self> {
        for path in default_search_paths() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(AnalyticsError::ConfigurationError(
            "No analytics.toml found in standard locations".to_string(),
        ))
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.quality.min_cop.is_nan()
            || self.quality.max_cop.is_nan()
            || self.quality.min_cop > self.quality.max_cop
        {
            return Err(format!(
                "quality.min_cop ({}) must not exceed quality.max_cop ({})",
                self.quality.min_cop, self.quality.max_cop
            )
            .into());
        }
        if not_positive(self.histogram.cop_bin_size) {
            return Err("histogram.cop_bin_size must be positive".into());
        }
        if self.histogram.energy_target_bins == 0 {
            return Err("histogram.energy_target_bins must be at least 1".into());
        }
        if not_positive(self.histogram.energy_bin_step_kwh) {
            return Err("histogram.energy_bin_step_kwh must be positive".into());
        }
        if not_positive(self.regression.tolerance) {
            return Err("regression.tolerance must be positive".into());
        }
        if not_positive(self.regression.huber_k) {
            return Err("regression.huber_k must be positive".into());
        }
        if not_positive(self.loess.bandwidth) || self.loess.bandwidth > 1.0 {
            return Err(format!(
                "loess.bandwidth must be in (0, 1], got {}",
                self.loess.bandwidth
            )
            .into());
        }
        if self.loess.curve_points < 2 {
            return Err("loess.curve_points must be at least 2".into());
        }
        Ok(())
    }

    pub fn cop_range(&self) -> CopRange {
        CopRange::new(self.quality.min_cop, self.quality.max_cop)
    }

    pub fn robust_regression_options(&self) -> RobustRegressionOptions {
        RobustRegressionOptions {
            max_iterations: self.regression.max_iterations,
            tolerance: self.regression.tolerance,
            huber_k: self.regression.huber_k,
        }
    }

    pub fn auto_bin_sizing(&self) -> AutoBinSizing {
        AutoBinSizing {
            target_bins: self.histogram.energy_target_bins,
            step: self.histogram.energy_bin_step_kwh,
            minimum: self.histogram.min_energy_bin_size_kwh,
        }
    }

    pub fn trend_options(&self) -> TrendOptions {
        TrendOptions {
            robust: self.robust_regression_options(),
            loess_bandwidth: self.loess.bandwidth,
            curve_points: self.loess.curve_points,
        }
    }
}
