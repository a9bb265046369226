//! Exporter error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    /// There is no collection to export
    #[error("collection file not found at {path}")]
    MissingCollection {
        /// Expected collection location
        path: PathBuf,
    },

    /// The collection file exists but is not a valid collection
    #[error("collection file {path} is malformed: {source}")]
    CorruptCollection {
        /// Collection location
        path: PathBuf,
        /// Parse failure
        #[source]
        source: serde_json::Error,
    },

    /// The prior export exists but cannot be parsed as CSV
    #[error("prior table {path} is malformed: {source}")]
    CorruptTable {
        /// Prior table location
        path: PathBuf,
        /// Parse failure
        #[source]
        source: csv::Error,
    },

    /// The prior export names the same column twice
    #[error("prior table {path} repeats column {column}")]
    DuplicateColumn {
        /// Prior table location
        path: PathBuf,
        /// Repeated header name
        column: String,
    },

    /// A table lacks the column rows are deduplicated by
    #[error("table has no {column} column")]
    MissingKeyColumn {
        /// Name of the absent column
        column: String,
    },

    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding failure while writing
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias using `ExportError`.
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExportError::MissingKeyColumn {
            column: "URL".to_string(),
        };
        assert_eq!(err.to_string(), "table has no URL column");

        let err = ExportError::MissingCollection {
            path: PathBuf::from("bama_cars.json"),
        };
        assert_eq!(err.to_string(), "collection file not found at bama_cars.json");
    }
}
