//! Configuration management for carvest.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Every section is `#[serde(default)]`,
//! so a config file only needs the values it changes.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "CARVEST_CONFIG";

/// Main application configuration.
///
/// This is loaded from `~/.config/carvest/config.toml` (or platform equivalent)
/// unless `CARVEST_CONFIG` points elsewhere. If the file doesn't exist,
/// default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Site being scraped
    pub target: TargetConfig,
    /// CSS selectors for index and detail pages
    pub selectors: SelectorConfig,
    /// Lazy-load scrolling on the index page
    pub scroll: ScrollConfig,
    /// Think time between listing visits
    pub pacing: PacingConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Output file locations
    pub storage: StorageConfig,
    /// Placeholder values for fields that could not be extracted
    pub sentinels: SentinelConfig,
    /// Tabular export settings
    pub export: ExportConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::config_path()?,
        };
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific file, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `CARVEST_INDEX_URL`: Override the listing index page
    /// - `CARVEST_HEADLESS`: Override browser headless mode (true/false)
    /// - `CARVEST_SCROLL_CYCLES`: Override the number of scroll cycles
    /// - `CARVEST_COLLECTION_PATH`: Override the JSON collection location
    /// - `CARVEST_TABLE_PATH`: Override the CSV export location
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Unparsable values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("CARVEST_INDEX_URL") {
            tracing::debug!("Override target.index_url from env: {}", val);
            self.target.index_url = val;
        }

        if let Some(val) = lookup("CARVEST_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(val) = lookup("CARVEST_SCROLL_CYCLES") {
            if let Ok(cycles) = val.parse() {
                self.scroll.cycles = cycles;
                tracing::debug!("Override scroll.cycles from env: {}", cycles);
            }
        }

        if let Some(val) = lookup("CARVEST_COLLECTION_PATH") {
            tracing::debug!("Override storage.collection_path from env: {}", val);
            self.storage.collection_path = PathBuf::from(val);
        }

        if let Some(val) = lookup("CARVEST_TABLE_PATH") {
            tracing::debug!("Override storage.table_path from env: {}", val);
            self.storage.table_path = PathBuf::from(val);
        }
    }

    /// Check values that would otherwise fail deep inside a run.
    pub fn validate(&self) -> ConfigResult<()> {
        url::Url::parse(&self.target.index_url).map_err(|e| ConfigError::InvalidValue {
            field: "target.index_url".to_string(),
            reason: e.to_string(),
        })?;

        self.scroll.delay.validate("scroll.delay")?;
        self.pacing.listing_delay.validate("pacing.listing_delay")?;

        if self.browser.navigation_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "browser.navigation_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.browser.idle_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "browser.idle_timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.selectors.detail_link.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "selectors.detail_link".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/carvest/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "carvest", "carvest").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Site being scraped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Listing index page; detail links are resolved against it
    pub index_url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            index_url: "https://bama.ir/car".to_string(),
        }
    }
}

/// CSS selectors for the index and detail pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Anchors on the index page that point at detail pages
    pub detail_link: String,
    /// Price element on a detail page
    pub price: String,
    /// Location element on a detail page
    pub location: String,
    /// Labels of the fixed-schema feature list
    pub feature_labels: String,
    /// Values of the fixed-schema feature list, matched to labels by position
    pub feature_values: String,
    /// Labels of the variable-schema feature list
    pub extra_feature_labels: String,
    /// Values of the variable-schema feature list, matched to labels by position
    pub extra_feature_values: String,
    /// Description paragraph on a detail page
    pub description: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            detail_link: "a[href^='/car/detail']".to_string(),
            price: "span.bama-ad-detail-price__price-text".to_string(),
            location: "span.address-text".to_string(),
            feature_labels: "span[data-v-23e2e990]".to_string(),
            feature_values: "p.dir-ltr".to_string(),
            extra_feature_labels: "span.bama-vehicle-detail-with-link__row-title".to_string(),
            extra_feature_values: "span.bama-vehicle-detail-with-link__row-text".to_string(),
            description: "p[data-v-7980cec8]".to_string(),
        }
    }
}

/// Inclusive range of milliseconds a randomized delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    /// Lower bound in milliseconds
    pub min_ms: u64,
    /// Upper bound in milliseconds
    pub max_ms: u64,
}

impl DelayRange {
    /// Create a range from bounds in milliseconds.
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A range that never waits.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// Lower bound as a duration.
    #[must_use]
    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    /// Upper bound as a duration.
    #[must_use]
    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    fn validate(&self, field: &str) -> ConfigResult<()> {
        if self.min_ms > self.max_ms {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                reason: format!(
                    "min_ms ({}) exceeds max_ms ({})",
                    self.min_ms, self.max_ms
                ),
            });
        }
        Ok(())
    }
}

/// Lazy-load scrolling on the index page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Number of scroll-and-wait cycles
    pub cycles: u32,
    /// Pixels per scroll; unset scrolls by the full document height
    pub pixels: Option<i64>,
    /// Randomized wait after each scroll
    pub delay: DelayRange,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            cycles: 30,
            pixels: None,
            delay: DelayRange::new(1500, 3500),
        }
    }
}

/// Think time between listing visits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Randomized wait after each detail page settles
    pub listing_delay: DelayRange,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            listing_delay: DelayRange::new(2500, 5000),
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Upper bound on waiting for the network to go quiet, in milliseconds
    pub idle_timeout_ms: u64,
    /// Chromium binary to launch instead of the auto-detected one
    pub chrome_executable: Option<PathBuf>,
}

impl BrowserConfig {
    /// Navigation timeout as a duration.
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Idle-wait cap as a duration.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout_secs: 60,
            idle_timeout_ms: 10_000,
            chrome_executable: None,
        }
    }
}

/// Output file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON collection of every listing scraped so far
    pub collection_path: PathBuf,
    /// Flattened CSV export
    pub table_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            collection_path: PathBuf::from("bama_cars.json"),
            table_path: PathBuf::from("bama_cars.csv"),
        }
    }
}

/// Placeholder values for fields that could not be extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// Used for price and location
    pub missing_value: String,
    /// Used for the description
    pub missing_description: String,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            missing_value: "N/A".to_string(),
            missing_description: "No description".to_string(),
        }
    }
}

/// Tabular export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Rows shown in the post-export preview
    pub preview_rows: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { preview_rows: 5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.target.index_url, "https://bama.ir/car");
        assert_eq!(config.scroll.cycles, 30);
        assert_eq!(config.scroll.delay, DelayRange::new(1500, 3500));
        assert_eq!(config.pacing.listing_delay, DelayRange::new(2500, 5000));
        assert!(config.browser.headless);
        assert_eq!(config.sentinels.missing_value, "N/A");
        assert_eq!(config.sentinels.missing_description, "No description");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[target]"));
        assert!(toml_str.contains("[selectors]"));
        assert!(toml_str.contains("[storage]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.selectors.detail_link, config.selectors.detail_link);
    }

    #[test]
    fn test_load_from_file_and_missing_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let missing = AppConfig::load_from(&config_path).expect("defaults for missing file");
        assert_eq!(missing.scroll.cycles, 30);

        let mut config = AppConfig::default();
        config.scroll.cycles = 5;
        config.storage.table_path = PathBuf::from("out/cars.csv");
        fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AppConfig::load_from(&config_path).expect("load config");
        assert_eq!(loaded.scroll.cycles, 5);
        assert_eq!(loaded.storage.table_path, PathBuf::from("out/cars.csv"));
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[target]
index_url = "https://example.com/cars"

[scroll]
cycles = 3
delay = { min_ms = 10, max_ms = 20 }
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.target.index_url, "https://example.com/cars");
        assert_eq!(config.scroll.cycles, 3);
        assert_eq!(config.scroll.delay, DelayRange::new(10, 20));
        // These should be defaults
        assert!(config.scroll.pixels.is_none());
        assert_eq!(config.browser.navigation_timeout_secs, 60);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CARVEST_INDEX_URL", "https://example.com/index"),
            ("CARVEST_HEADLESS", "false"),
            ("CARVEST_SCROLL_CYCLES", "not-a-number"),
            ("CARVEST_TABLE_PATH", "/tmp/cars.csv"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.target.index_url, "https://example.com/index");
        assert!(!config.browser.headless);
        assert_eq!(config.scroll.cycles, 30);
        assert_eq!(config.storage.table_path, PathBuf::from("/tmp/cars.csv"));
        assert_eq!(
            config.storage.collection_path,
            PathBuf::from("bama_cars.json")
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.pacing.listing_delay = DelayRange::new(500, 100);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pacing.listing_delay"));

        let mut config = AppConfig::default();
        config.target.index_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.browser.navigation_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.browser.idle_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("browser.idle_timeout_ms"));
    }
}
