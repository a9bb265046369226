use crate::error::{BrowserError, Result};
use std::time::Duration;

/// A browser that hands out tabs.
#[async_trait::async_trait]
pub trait BrowserSession: Send + Sync {
    /// Tab type produced by this session
    type Page: PageDriver;

    /// Open a fresh blank tab
    async fn open_page(&self) -> Result<Self::Page>;

    /// Shut the browser down, closing any tab still open
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Page-level operations for automation
#[async_trait::async_trait]
pub trait PageDriver: Send + Sync {
    /// Element handle returned by queries
    type Element: PageElement;

    /// Navigate to a URL, failing if the load does not finish within `timeout`
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait until the page has settled and network activity has quieted
    async fn wait_until_idle(&self) -> Result<()>;

    /// Scroll down by `pixels`, or by one full document height when `None`
    async fn scroll_by(&self, pixels: Option<i64>) -> Result<()>;

    /// All elements matching a CSS selector, in document order
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// Close the tab
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// A handle to one element on a page
#[async_trait::async_trait]
pub trait PageElement: Send + Sync {
    /// Rendered text of the element
    async fn text(&self) -> Result<String>;

    /// Value of an attribute, if present
    async fn attribute(&self, name: &str) -> Result<Option<String>>;
}

/// Resolve a link found on `base` into an absolute URL without fragment
pub fn resolve_link(base: &str, href: &str) -> Result<String> {
    let base = url::Url::parse(base)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid base URL: {}", e)))?;
    let mut resolved = base
        .join(href.trim())
        .map_err(|e| BrowserError::NavigationError(format!("Invalid link {href:?}: {}", e)))?;
    resolved.set_fragment(None);
    Ok(resolved.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_link() {
        assert_eq!(
            resolve_link("https://bama.ir/car", "/car/detail-abc123").unwrap(),
            "https://bama.ir/car/detail-abc123"
        );
    }

    #[test]
    fn test_resolve_absolute_link_strips_fragment() {
        assert_eq!(
            resolve_link("https://bama.ir/car", "https://bama.ir/car/detail-1#gallery").unwrap(),
            "https://bama.ir/car/detail-1"
        );
    }

    #[test]
    fn test_resolve_link_invalid_base() {
        assert!(resolve_link("nowhere", "/car/detail-1").is_err());
    }
}
