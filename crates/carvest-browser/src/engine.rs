use crate::driver::{BrowserSession, PageDriver, PageElement};
use crate::error::{BrowserError, Result};
use crate::fingerprint::Fingerprint;
use carvest_core::BrowserConfig as LaunchSettings;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Resource-count stability check run inside the page. Resolves once the
/// document is complete and no new resources were requested for a quiet
/// window, or when the cap elapses.
const NETWORK_IDLE_SCRIPT: &str = r#"(async () => {
    const timeoutMs = __TIMEOUT_MS__;
    const quietMs = 500;
    const interval = 100;
    const start = Date.now();
    const count = () => {
        try { return performance.getEntriesByType('resource').length; } catch (_) { return 0; }
    };
    let last = count();
    let stable = 0;
    while (Date.now() - start < timeoutMs) {
        await new Promise(r => setTimeout(r, interval));
        const current = count();
        if (document.readyState === 'complete' && current === last) {
            stable += interval;
            if (stable >= quietMs) {
                return { ok: true, waitedMs: Date.now() - start };
            }
        } else {
            stable = 0;
        }
        last = current;
    }
    return { ok: false, waitedMs: Date.now() - start };
})()"#;

/// Headless Chromium driven over CDP
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    fingerprint: Fingerprint,
    idle_timeout: Duration,
}

impl ChromeSession {
    /// Launch Chromium with a randomized fingerprint
    pub async fn launch(settings: &LaunchSettings) -> Result<Self> {
        Self::with_fingerprint(settings, Fingerprint::randomized()).await
    }

    /// Launch Chromium presenting a specific fingerprint
    pub async fn with_fingerprint(
        settings: &LaunchSettings,
        fingerprint: Fingerprint,
    ) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .arg(format!("--user-agent={}", fingerprint.user_agent));

        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &settings.chrome_executable {
            builder = builder.chrome_executable(executable);
        }

        let config = builder
            .build()
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Drive the CDP connection until the browser goes away
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error: {}", e);
                }
            }
        });

        tracing::info!(
            "Launched browser ({}x{}, headless={})",
            fingerprint.viewport_width,
            fingerprint.viewport_height,
            settings.headless
        );
        tracing::debug!("User agent: {}", fingerprint.user_agent);

        Ok(Self {
            browser,
            handler,
            fingerprint,
            idle_timeout: settings.idle_timeout(),
        })
    }

    /// Identity this session presents
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

#[async_trait::async_trait]
impl BrowserSession for ChromeSession {
    type Page = ChromePage;

    async fn open_page(&self) -> Result<ChromePage> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(ChromePage {
            page: Some(page),
            idle_timeout: self.idle_timeout,
        })
    }

    async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Waiting for browser exit failed: {}", e);
        }
        self.handler.abort();
        tracing::debug!("Browser closed");
        closed.map(|_| ()).map_err(BrowserError::from)
    }
}

/// One Chromium tab.
///
/// Closing explicitly is preferred. A tab dropped without `close` is closed
/// in a background task so error paths do not leak tabs.
pub struct ChromePage {
    page: Option<Page>,
    idle_timeout: Duration,
}

impl ChromePage {
    fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or(BrowserError::PageClosed)
    }
}

#[async_trait::async_trait]
impl PageDriver for ChromePage {
    type Element = ChromeElement;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let page = self.page()?;
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::NavigationError(format!("{url}: {e}"))),
            Err(_) => Err(BrowserError::Timeout(format!(
                "navigating to {url} took longer than {timeout:?}"
            ))),
        }
    }

    async fn wait_until_idle(&self) -> Result<()> {
        let page = self.page()?;

        match tokio::time::timeout(self.idle_timeout, page.wait_for_navigation()).await {
            Ok(result) => {
                result?;
            }
            Err(_) => {
                return Err(BrowserError::Timeout(format!(
                    "page load did not finish within {:?}",
                    self.idle_timeout
                )))
            }
        }

        let timeout_ms = u64::try_from(self.idle_timeout.as_millis()).unwrap_or(u64::MAX);
        let script = NETWORK_IDLE_SCRIPT.replace("__TIMEOUT_MS__", &timeout_ms.to_string());
        let info: serde_json::Value = page
            .evaluate(script)
            .await?
            .into_value()
            .unwrap_or_default();

        let waited = info.get("waitedMs").and_then(serde_json::Value::as_u64).unwrap_or(0);
        if info.get("ok").and_then(serde_json::Value::as_bool).unwrap_or(false) {
            tracing::debug!("Network idle after {}ms", waited);
        } else {
            // Pages with long-polling never go quiet; carry on with what rendered
            tracing::warn!("Network still busy after {}ms, continuing", waited);
        }
        Ok(())
    }

    async fn scroll_by(&self, pixels: Option<i64>) -> Result<()> {
        let script = match pixels {
            Some(px) => format!("window.scrollBy(0, {px})"),
            None => "window.scrollBy(0, document.body.scrollHeight)".to_string(),
        };
        self.page()?.evaluate(script).await?;
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ChromeElement>> {
        let elements = self.page()?.find_elements(selector).await?;
        Ok(elements.into_iter().map(ChromeElement).collect())
    }

    async fn close(mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            page.close().await?;
        }
        Ok(())
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        tracing::warn!("Background tab close failed: {}", e);
                    }
                });
            }
        }
    }
}

/// Element handle inside a Chromium tab
pub struct ChromeElement(Element);

#[async_trait::async_trait]
impl PageElement for ChromeElement {
    async fn text(&self) -> Result<String> {
        Ok(self.0.inner_text().await?.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.0.attribute(name).await?)
    }
}
