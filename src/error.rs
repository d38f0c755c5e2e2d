/// Error types for loading input documents and validating breakpoint tables
use thiserror::Error;

/// Failure while fetching or parsing one of the input GeoJSON documents
#[derive(Error, Debug)]
pub enum LoadError {
    /// Reading a local file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP request failed or returned a non-success status
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Fetch did not finish within the configured timeout
    #[error("Fetching {0} timed out")]
    Timeout(String),

    /// Document is not valid GeoJSON
    #[error("Failed to parse GeoJSON from {source_name}: {source}")]
    Parse {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Document parsed but is not a FeatureCollection
    #[error("{0} must be a GeoJSON FeatureCollection")]
    NotFeatureCollection(String),
}

/// Breakpoint table rejected during construction
#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    /// No thresholds supplied
    #[error("Breakpoint table needs at least one threshold")]
    Empty,

    /// Palette size does not match the threshold count
    #[error("Expected {expected} colors for {thresholds} thresholds, found {found}")]
    PaletteSize {
        thresholds: usize,
        expected: usize,
        found: usize,
    },

    /// Threshold is NaN or infinite
    #[error("Threshold {index} is not a finite number")]
    NonFinite { index: usize },

    /// Thresholds are not strictly ascending
    #[error("Threshold {index} ({value}) is not greater than the previous threshold")]
    NotAscending { index: usize, value: f64 },

    /// Color is not a `#rrggbb` hex code
    #[error("Invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),
}
