//! Candidate link discovery on the listing index.

use crate::error::{CollectorError, Result};
use crate::pacing;
use carvest_browser::{resolve_link, PageDriver, PageElement};
use carvest_core::AppConfig;
use std::collections::HashSet;

/// Load the index page, scroll to trigger lazy loading, and collect detail
/// links as absolute URLs in first-seen order.
///
/// Returns [`CollectorError::NoListings`] when the page yields no links.
pub async fn discover_candidate_links<P: PageDriver>(
    page: &P,
    config: &AppConfig,
) -> Result<Vec<String>> {
    let index_url = config.target.index_url.as_str();

    page.navigate(index_url, config.browser.navigation_timeout())
        .await?;
    page.wait_until_idle().await?;

    for cycle in 0..config.scroll.cycles {
        page.scroll_by(config.scroll.pixels).await?;
        pacing::pause(config.scroll.delay).await;
        tracing::trace!("Scroll cycle {}/{}", cycle + 1, config.scroll.cycles);
    }

    let anchors = page.query_all(&config.selectors.detail_link).await?;
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in anchors {
        let href = match anchor.attribute("href").await {
            Ok(Some(href)) if !href.trim().is_empty() => href,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("Could not read link href: {}", e);
                continue;
            }
        };

        match resolve_link(index_url, &href) {
            Ok(url) => {
                if seen.insert(url.clone()) {
                    links.push(url);
                }
            }
            Err(e) => tracing::debug!("Skipping unresolvable link {}: {}", href, e),
        }
    }

    tracing::info!("Found {} listing links on {}", links.len(), index_url);

    if links.is_empty() {
        return Err(CollectorError::NoListings {
            index_url: index_url.to_string(),
        });
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carvest_browser::{BrowserSession, SnapshotSession};
    use carvest_core::DelayRange;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.scroll.cycles = 3;
        config.scroll.delay = DelayRange::none();
        config
    }

    #[tokio::test]
    async fn test_links_resolved_and_deduplicated() {
        let index = r#"
            <a href="/car/detail-b">B</a>
            <a href="/car/detail-a#photos">A</a>
            <a href="/car/detail-b">B again</a>
            <a href="">empty</a>
            <a href="/car/other">not a listing</a>
        "#;
        let session = SnapshotSession::new([("https://bama.ir/car", index)]);
        let stats = session.stats();
        let page = session.open_page().await.unwrap();

        let links = discover_candidate_links(&page, &config()).await.unwrap();
        assert_eq!(
            links,
            vec![
                "https://bama.ir/car/detail-b".to_string(),
                "https://bama.ir/car/detail-a".to_string(),
            ]
        );
        assert_eq!(stats.scrolls(), 3);
    }

    #[tokio::test]
    async fn test_no_links_is_no_listings() {
        let session = SnapshotSession::new([("https://bama.ir/car", "<p>nothing here</p>")]);
        let page = session.open_page().await.unwrap();

        let err = discover_candidate_links(&page, &config()).await.unwrap_err();
        assert!(matches!(err, CollectorError::NoListings { .. }));
    }

    #[tokio::test]
    async fn test_index_navigation_failure_propagates() {
        let session = SnapshotSession::new(Vec::<(String, String)>::new());
        let page = session.open_page().await.unwrap();

        let err = discover_candidate_links(&page, &config()).await.unwrap_err();
        assert!(matches!(err, CollectorError::Browser(_)));
    }
}
