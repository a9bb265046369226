//! Carvest application shell
//!
//! Wires configuration, logging, the collector and the exporter together.
//! Scraping and table logic live in the `crates/` directory.

use anyhow::Context;
use carvest_browser::BrowserSession;
use carvest_collector::{run_scrape, Collector, ScrapeOutcome, ScrapeSummary};
use carvest_core::AppConfig;
use carvest_export::{ExportSummary, Exporter};
use tracing::info;

/// Result of one full pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineReport {
    /// Collection persisted and exported
    Completed {
        /// Collector counters
        scrape: ScrapeSummary,
        /// Exporter counters
        export: ExportSummary,
    },
    /// Nothing was discovered, so neither file was touched
    NoListings,
}

/// Initialize tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,carvest=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

/// Collect with a real browser, then export.
pub async fn run_pipeline(config: &AppConfig) -> anyhow::Result<PipelineReport> {
    let outcome = run_scrape(config)
        .await
        .context("collecting listings failed")?;
    finish(config, outcome)
}

/// Collect through an already open session, then export.
pub async fn run_pipeline_with<S: BrowserSession>(
    config: &AppConfig,
    session: &S,
) -> anyhow::Result<PipelineReport> {
    let outcome = Collector::new(config.clone())
        .scrape(session)
        .await
        .context("collecting listings failed")?;
    finish(config, outcome)
}

fn finish(config: &AppConfig, outcome: ScrapeOutcome) -> anyhow::Result<PipelineReport> {
    match outcome {
        ScrapeOutcome::Persisted { path, summary } => {
            info!("Data saved to {}", path.display());
            let export = Exporter::from_config(config)
                .run(&path)
                .with_context(|| format!("exporting {} failed", path.display()))?;
            Ok(PipelineReport::Completed {
                scrape: summary,
                export,
            })
        }
        ScrapeOutcome::NoListings => {
            info!("No listings found, skipping export");
            Ok(PipelineReport::NoListings)
        }
    }
}

/// Entry point used by the `carvest` binary
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Carvest v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_with_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    match run_pipeline(&config).await? {
        PipelineReport::Completed { scrape, export } => info!(
            "Done: {} new listings, {} in collection, {} rows in {}",
            scrape.scraped,
            scrape.total,
            export.total_rows,
            export.path.display()
        ),
        PipelineReport::NoListings => info!("Done: nothing to update"),
    }
    Ok(())
}
