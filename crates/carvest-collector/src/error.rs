use carvest_browser::BrowserError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("No listing links found on {index_url}")]
    NoListings { index_url: String },

    #[error("Collection file {path} is malformed: {source}")]
    CorruptCollection {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
}

pub type Result<T> = std::result::Result<T, CollectorError>;
