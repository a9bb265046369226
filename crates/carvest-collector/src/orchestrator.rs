//! Incremental scrape orchestration.
//!
//! A run is one read-modify-write transaction over the collection file:
//! load it once, append new listings in memory, and overwrite it once at
//! the end. Listings are visited one at a time in discovery order.

use crate::discovery::discover_candidate_links;
use crate::error::{CollectorError, Result};
use crate::extractor::extract_listing;
use crate::store;
use carvest_browser::{BrowserSession, ChromeSession, PageDriver};
use carvest_core::{AppConfig, ListingRecord};
use std::path::PathBuf;

/// Counters for one collector run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    /// Candidate links found on the index page
    pub discovered: usize,
    /// Candidates skipped because their URL was already collected
    pub skipped_duplicates: usize,
    /// Listings extracted and added this run
    pub scraped: usize,
    /// Listings that failed and will be retried on the next run
    pub failed: usize,
    /// Size of the persisted collection
    pub total: usize,
}

/// How a collector run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// The collection was written to `path`
    Persisted {
        /// Location of the collection file
        path: PathBuf,
        /// Run counters
        summary: ScrapeSummary,
    },
    /// The index yielded no links; nothing was written
    NoListings,
}

/// Drives discovery and extraction against a browser session.
pub struct Collector {
    config: AppConfig,
}

impl Collector {
    /// Create a collector for the given configuration.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Configuration this collector runs with.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Bring the persisted collection up to date with the index page.
    ///
    /// A listing that fails is logged and skipped; it is never marked seen,
    /// so the next run tries it again. If the index yields no links the
    /// existing collection file is left untouched.
    pub async fn scrape<S: BrowserSession>(&self, session: &S) -> Result<ScrapeOutcome> {
        let path = &self.config.storage.collection_path;
        let mut collection = store::load_existing_collection(path)?;
        tracing::info!("Starting with {} known listings", collection.len());

        let candidates = match self.discover(session).await {
            Ok(links) => links,
            Err(CollectorError::NoListings { index_url }) => {
                tracing::warn!("No listings found on {}, leaving collection as is", index_url);
                return Ok(ScrapeOutcome::NoListings);
            }
            Err(e) => return Err(e),
        };

        let mut summary = ScrapeSummary {
            discovered: candidates.len(),
            ..ScrapeSummary::default()
        };

        for (index, url) in candidates.iter().enumerate() {
            if collection.contains_url(url) {
                tracing::debug!("Skipping duplicate: {}", url);
                summary.skipped_duplicates += 1;
                continue;
            }

            tracing::debug!("Visiting listing {}/{}: {}", index + 1, candidates.len(), url);
            match self.scrape_listing(session, url).await {
                Ok(record) => {
                    tracing::info!("Scraped {} ({} fields)", url, record.field_count());
                    tracing::debug!("Record: {:?}", record);
                    // Marked seen only after a successful extraction
                    collection.push(record);
                    summary.scraped += 1;
                }
                Err(e) => {
                    tracing::warn!("Error scraping listing {}: {}", url, e);
                    summary.failed += 1;
                }
            }
        }

        summary.total = collection.len();
        store::persist_collection(path, &collection)?;

        tracing::info!(
            "Collector finished: {} discovered, {} new, {} already known, {} failed, {} total",
            summary.discovered,
            summary.scraped,
            summary.skipped_duplicates,
            summary.failed,
            summary.total
        );

        Ok(ScrapeOutcome::Persisted {
            path: path.clone(),
            summary,
        })
    }

    /// Discover candidate links on a dedicated tab that is always closed.
    async fn discover<S: BrowserSession>(&self, session: &S) -> Result<Vec<String>> {
        let page = session.open_page().await?;
        let result = discover_candidate_links(&page, &self.config).await;
        close_page(page, &self.config.target.index_url).await;
        result
    }

    /// Extract one listing on its own tab, closing the tab on every path.
    async fn scrape_listing<S: BrowserSession>(
        &self,
        session: &S,
        url: &str,
    ) -> Result<ListingRecord> {
        let page = session.open_page().await?;
        let result = extract_listing(&page, url, &self.config).await;
        close_page(page, url).await;
        result
    }
}

async fn close_page<P: PageDriver>(page: P, url: &str) {
    if let Err(e) = page.close().await {
        tracing::warn!("Failed to close tab for {}: {}", url, e);
    }
}

/// Launch Chromium, run the collector, and shut the browser down whatever
/// the outcome.
pub async fn run_scrape(config: &AppConfig) -> Result<ScrapeOutcome> {
    let session = ChromeSession::launch(&config.browser).await?;
    let collector = Collector::new(config.clone());

    let outcome = collector.scrape(&session).await;

    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close browser: {}", e);
    }
    outcome
}
