use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("page already closed")]
    PageClosed,
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::ChromiumError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrowserError::NavigationError("page not found".to_string());
        assert_eq!(err.to_string(), "navigation failed: page not found");
    }

    #[test]
    fn test_timeout_error() {
        let err = BrowserError::Timeout("https://bama.ir/car after 60s".to_string());
        assert!(err.to_string().contains("bama.ir"));
    }
}
