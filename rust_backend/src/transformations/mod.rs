//! Row- and system-level transformations applied before charting.
//!
//! # Modules
//!
//! - [`quality`]: Drop physically impossible COP values and negative energy
//! - [`filtering`]: Evaluate filter groups and split data into two comparison groups
//!
//! # Example
//!
//! ```
//! use heatpump_analytics::models::SystemEfficiency;
//! use heatpump_analytics::transformations::filter_systems_by_realistic_cop;
//!
//! let systems = vec![
//!     SystemEfficiency::from_totals("hp-1", 350.0, 100.0, 0.0, 0.0),
//!     SystemEfficiency::from_totals("hp-2", 900.0, 100.0, 0.0, 0.0),
//! ];
//! let kept = filter_systems_by_realistic_cop(&systems);
//! assert_eq!(kept.len(), 1);
//! ```

pub mod filtering;
pub mod quality;


pub use filtering::{
    apply_filters_to_data, apply_filters_with_resolver, partition_into_groups, ComparisonGroups,
    FieldValue, FilterGroup, FilterOperator, FilterPredicate, FilterableRecord, GroupSubset,
};
pub use quality::{
    filter_realistic_rows, filter_realistic_rows_in, filter_systems_by_realistic_cop,
    filter_systems_by_realistic_cop_with, filter_systems_in, is_realistic_cop, CopRange,
    QualityReport,
};
