//! Carvest Collector - incremental listing collection.
//!
//! This crate keeps a persisted JSON collection of classified listings up to
//! date. A run loads the existing collection, discovers candidate detail
//! links on the index page, visits each link not yet collected, and writes
//! the whole collection back once at the end.
//!
//! # Features
//!
//! - Lazy-load scrolling with randomized, configurable delays
//! - Per-field sentinel fallback and per-listing failure isolation
//! - Deduplication by listing URL across runs
//! - Empty-discovery safeguard that never overwrites a good collection
//! - Atomic collection writes (temporary file + rename)
//!
//! # Example
//!
//! ```rust,ignore
//! use carvest_collector::{run_scrape, ScrapeOutcome};
//! use carvest_core::AppConfig;
//!
//! let config = AppConfig::load_with_env()?;
//! match run_scrape(&config).await? {
//!     ScrapeOutcome::Persisted { path, summary } => println!("{} listings in {}", summary.total, path.display()),
//!     ScrapeOutcome::NoListings => println!("nothing to do"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod discovery;
#[allow(missing_docs)]
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod pacing;
pub mod store;

// Re-export commonly used types
pub use discovery::discover_candidate_links;
pub use error::{CollectorError, Result};
pub use extractor::{extract_listing, zip_features};
pub use orchestrator::{run_scrape, Collector, ScrapeOutcome, ScrapeSummary};
pub use store::{load_existing_collection, persist_collection};
