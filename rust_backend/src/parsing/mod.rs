//! Parsers for measurement data exported by the data backend.
//!
//! # Parsers
//!
//! - [`json_parser`]: Parse JSON arrays of measurement rows
//!
//! # Example
//!
//! ```no_run
//! use heatpump_analytics::parsing::json_parser::parse_measurement_rows_json;
//! use std::path::Path;
//!
//! let rows = parse_measurement_rows_json(Path::new("rows.json"))
//!     .expect("Failed to parse measurement rows");
//! ```

pub mod json_parser;


pub use json_parser::{parse_measurement_rows_json, parse_measurement_rows_json_str};
