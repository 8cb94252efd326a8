//! Error types for the configuration layer.
//!
//! The numeric core never fails: insufficient or degenerate data yields
//! `None` or empty results. Errors only arise at the edges, when reading
//! configuration.

/// Result type for fallible analytics setup operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Error type for analytics setup operations
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl From<String> for AnalyticsError {
    fn from(s: String) -> Self {
        AnalyticsError::ConfigurationError(s)
    }
}

impl From<&str> for AnalyticsError {
    fn from(s: &str) -> Self {
        AnalyticsError::ConfigurationError(s.to_string())
    }
}
