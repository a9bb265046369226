//! Offline page driver backed by captured HTML.
//!
//! Serves fixed documents keyed by URL through the same traits as the
//! Chromium engine, so collection logic can run without a browser.

use crate::driver::{BrowserSession, PageDriver, PageElement};
use crate::error::{BrowserError, Result};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Counters shared between a session, its pages and observers.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStats {
    inner: Arc<StatsInner>,
}

#[derive(Debug, Default)]
struct StatsInner {
    open_pages: AtomicUsize,
    opened_total: AtomicUsize,
    navigations: AtomicUsize,
    scrolls: AtomicUsize,
    session_closed: AtomicBool,
}

impl SnapshotStats {
    /// Tabs opened and not yet explicitly closed
    pub fn open_pages(&self) -> usize {
        self.inner.open_pages.load(Ordering::SeqCst)
    }

    /// Tabs opened over the session's lifetime
    pub fn opened_total(&self) -> usize {
        self.inner.opened_total.load(Ordering::SeqCst)
    }

    /// Navigation attempts, successful or not
    pub fn navigations(&self) -> usize {
        self.inner.navigations.load(Ordering::SeqCst)
    }

    /// Scroll calls across all tabs
    pub fn scrolls(&self) -> usize {
        self.inner.scrolls.load(Ordering::SeqCst)
    }

    /// Whether the session itself was closed
    pub fn session_closed(&self) -> bool {
        self.inner.session_closed.load(Ordering::SeqCst)
    }
}

/// Browser session serving captured documents
#[derive(Debug, Clone, Default)]
pub struct SnapshotSession {
    documents: Arc<HashMap<String, String>>,
    stats: SnapshotStats,
}

impl SnapshotSession {
    /// Create a session from `(url, html)` pairs
    pub fn new<I, U, H>(documents: I) -> Self
    where
        I: IntoIterator<Item = (U, H)>,
        U: Into<String>,
        H: Into<String>,
    {
        Self {
            documents: Arc::new(
                documents
                    .into_iter()
                    .map(|(url, html)| (url.into(), html.into()))
                    .collect(),
            ),
            stats: SnapshotStats::default(),
        }
    }

    /// Handle for observing tab and scroll activity
    pub fn stats(&self) -> SnapshotStats {
        self.stats.clone()
    }
}

#[async_trait::async_trait]
impl BrowserSession for SnapshotSession {
    type Page = SnapshotPage;

    async fn open_page(&self) -> Result<SnapshotPage> {
        self.stats.inner.open_pages.fetch_add(1, Ordering::SeqCst);
        self.stats.inner.opened_total.fetch_add(1, Ordering::SeqCst);
        Ok(SnapshotPage {
            documents: Arc::clone(&self.documents),
            current: Mutex::new(None),
            stats: self.stats.clone(),
        })
    }

    async fn close(self) -> Result<()> {
        self.stats.inner.session_closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// One tab of a [`SnapshotSession`]
#[derive(Debug)]
pub struct SnapshotPage {
    documents: Arc<HashMap<String, String>>,
    current: Mutex<Option<String>>,
    stats: SnapshotStats,
}

impl SnapshotPage {
    fn current_html(&self) -> Result<String> {
        let current = self
            .current
            .lock()
            .map_err(|_| BrowserError::ChromiumError("snapshot page lock poisoned".to_string()))?;
        let url = current
            .as_ref()
            .ok_or_else(|| BrowserError::NavigationError("no page loaded".to_string()))?;
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| BrowserError::NavigationError(format!("no snapshot for {url}")))
    }
}

#[async_trait::async_trait]
impl PageDriver for SnapshotPage {
    type Element = SnapshotElement;

    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.stats.inner.navigations.fetch_add(1, Ordering::SeqCst);
        if !self.documents.contains_key(url) {
            return Err(BrowserError::NavigationError(format!("no snapshot for {url}")));
        }
        let mut current = self
            .current
            .lock()
            .map_err(|_| BrowserError::ChromiumError("snapshot page lock poisoned".to_string()))?;
        *current = Some(url.to_string());
        Ok(())
    }

    async fn wait_until_idle(&self) -> Result<()> {
        self.current_html().map(|_| ())
    }

    async fn scroll_by(&self, _pixels: Option<i64>) -> Result<()> {
        self.stats.inner.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<SnapshotElement>> {
        let html = self.current_html()?;
        select_elements(&html, selector)
    }

    async fn close(self) -> Result<()> {
        self.stats.inner.open_pages.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Parse a document and materialize every element matching `selector`
fn select_elements(html: &str, selector: &str) -> Result<Vec<SnapshotElement>> {
    let selector = Selector::parse(selector)
        .map_err(|e| BrowserError::InvalidSelector(format!("{selector}: {e}")))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .map(|el| SnapshotElement {
            text: el.text().collect::<String>(),
            attributes: el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
        .collect())
}

/// Materialized element from a snapshot document
#[derive(Debug, Clone)]
pub struct SnapshotElement {
    text: String,
    attributes: HashMap<String, String>,
}

#[async_trait::async_trait]
impl PageElement for SnapshotElement {
    async fn text(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.attributes.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"
        <html><body>
            <a href="/car/detail-1">First</a>
            <a class="other" href="/news">News</a>
            <a href="/car/detail-2">Second</a>
        </body></html>
    "#;

    fn session() -> SnapshotSession {
        SnapshotSession::new([("https://bama.ir/car", INDEX)])
    }

    #[tokio::test]
    async fn test_query_all_returns_matches_in_order() {
        let session = session();
        let page = session.open_page().await.unwrap();
        page.navigate("https://bama.ir/car", Duration::from_secs(1))
            .await
            .unwrap();

        let links = page.query_all("a[href^='/car/detail']").await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text().await.unwrap(), "First");
        assert_eq!(
            links[1].attribute("href").await.unwrap().as_deref(),
            Some("/car/detail-2")
        );
        assert_eq!(links[0].attribute("class").await.unwrap(), None);

        page.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_navigate_unknown_url_fails() {
        let session = session();
        let page = session.open_page().await.unwrap();
        let err = page
            .navigate("https://bama.ir/car/detail-404", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BrowserError::NavigationError(_)));
        assert!(page.query_all("a").await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_selector() {
        let session = session();
        let page = session.open_page().await.unwrap();
        page.navigate("https://bama.ir/car", Duration::from_secs(1))
            .await
            .unwrap();
        let err = page.query_all("a[[").await.unwrap_err();
        assert!(matches!(err, BrowserError::InvalidSelector(_)));
    }

    #[tokio::test]
    async fn test_stats_track_tabs() {
        let session = session();
        let stats = session.stats();

        let first = session.open_page().await.unwrap();
        let second = session.open_page().await.unwrap();
        first.scroll_by(None).await.unwrap();
        assert_eq!(stats.open_pages(), 2);

        first.close().await.unwrap();
        second.close().await.unwrap();
        session.close().await.unwrap();

        assert_eq!(stats.open_pages(), 0);
        assert_eq!(stats.opened_total(), 2);
        assert_eq!(stats.scrolls(), 1);
        assert!(stats.session_closed());
    }
}
