//! Page driver capability for carvest.
//!
//! Defines the browser, tab and element traits the collector drives, with
//! a headless Chromium implementation and an offline snapshot
//! implementation over captured HTML.

pub mod driver;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod snapshot;

pub use driver::{resolve_link, BrowserSession, PageDriver, PageElement};
pub use engine::{ChromePage, ChromeSession};
pub use error::{BrowserError, Result};
pub use fingerprint::Fingerprint;
pub use snapshot::{SnapshotSession, SnapshotStats};
