//! Carvest Export - flattened CSV view of the listing collection.
//!
//! Records carry different feature keys, so the table's columns are derived
//! from the union of all keys rather than a fixed schema. Every export is
//! merged with the previous CSV and deduplicated by `URL`, the latest row
//! winning.
//!
//! # Example
//!
//! ```rust,ignore
//! use carvest_export::Exporter;
//!
//! let summary = Exporter::new("bama_cars.csv", 5).run("bama_cars.json".as_ref())?;
//! println!("{} rows", summary.total_rows);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod exporter;
pub mod table;

// Re-export commonly used types
pub use error::{ExportError, Result};
pub use exporter::{
    export, merge_tables, merge_with_existing, read_table, write_table, ExportSummary, Exporter,
};
pub use table::Table;
