//! Carvest Core - Foundation crate for the carvest listing scraper.
//!
//! This crate provides the listing record model, error types and
//! configuration management that the collector, exporter and binary share.
//!
//! # Modules
//!
//! - [`error`] - Configuration and record errors using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`record`] - `ListingRecord` field maps and the deduplicated `Collection`
//!
//! # Example
//!
//! ```rust
//! use carvest_core::{AppConfig, Collection, ListingRecord};
//!
//! let config = AppConfig::default();
//! let mut collection = Collection::new();
//! let record = ListingRecord::new(
//!     "https://bama.ir/car/detail-abc",
//!     "1,250,000,000",
//!     "Tehran",
//!     config.sentinels.missing_description.clone(),
//! );
//! assert!(collection.push(record.clone()));
//! assert!(!collection.push(record));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod record;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, DelayRange, ExportConfig, PacingConfig, ScrollConfig,
    SelectorConfig, SentinelConfig, StorageConfig, TargetConfig,
};
pub use error::{ConfigError, ConfigResult, RecordError};
pub use record::{
    Collection, ListingRecord, FIELD_DESCRIPTION, FIELD_LOCATION, FIELD_PRICE, FIELD_URL,
    MANDATORY_FIELDS,
};
