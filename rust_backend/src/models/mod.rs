//! Data model for measurement rows and derived efficiency records.

pub mod records;
pub mod system;

pub use records::*;
pub use system::*;
