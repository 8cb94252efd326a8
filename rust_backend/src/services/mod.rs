//! Service layer producing chart-ready data.
//!
//! Services combine the models, transformations and algorithms into the
//! outputs a charting layer consumes: per-system efficiency, histograms,
//! temperature trends and two-group comparisons.

pub mod aggregation;
pub mod compare;
pub mod distributions;
pub mod trends;

#[cfg(test)]
mod aggregation_tests;

pub use aggregation::{
    calculate_daily_taz, calculate_system_az, calculate_taz_per_day, group_data_by_index,
    hour_index, month_index, process_dataset, AggregationMode,
};
pub use compare::{compare_groups, merge_comparison_datasets, GroupComparison, GroupSummary};
pub use distributions::{
    auto_energy_bin_size, create_auto_sized_histogram, create_histogram_bins, AutoBinSizing,
    HistogramBin, HistogramField, HistogramResult, HistogramSource, HistogramStats,
};
pub use trends::{
    compute_temperature_trend, compute_weighted_temperature_trend, generate_curve_points,
    points_from_observations, prepare_regression_points, CopSeries, TemperatureTrend,
    TrendOptions,
};
