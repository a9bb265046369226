//! Detail page extraction.
//!
//! Every field degrades independently: a missing or unreadable element
//! becomes a sentinel (for the mandatory fields) or is left out (for
//! feature pairs). Only failing to load the page fails the listing.

use crate::error::Result;
use crate::pacing;
use carvest_browser::{PageDriver, PageElement};
use carvest_core::{AppConfig, ListingRecord};

/// Visit a detail page and build its record.
pub async fn extract_listing<P: PageDriver>(
    page: &P,
    url: &str,
    config: &AppConfig,
) -> Result<ListingRecord> {
    page.navigate(url, config.browser.navigation_timeout())
        .await?;
    page.wait_until_idle().await?;
    pacing::pause(config.pacing.listing_delay).await;

    let selectors = &config.selectors;
    let sentinels = &config.sentinels;

    let price = first_text(page, &selectors.price)
        .await
        .unwrap_or_else(|| sentinels.missing_value.clone());
    let location = first_text(page, &selectors.location)
        .await
        .unwrap_or_else(|| sentinels.missing_value.clone());

    let mut features = read_pairs(page, &selectors.feature_labels, &selectors.feature_values).await;
    features.extend(
        read_pairs(
            page,
            &selectors.extra_feature_labels,
            &selectors.extra_feature_values,
        )
        .await,
    );

    let description = first_text(page, &selectors.description)
        .await
        .unwrap_or_else(|| sentinels.missing_description.clone());

    let mut record = ListingRecord::new(url, price, location, description);
    record.merge_features(features);
    Ok(record)
}

/// Trimmed text of the first element matching `selector`, if any.
async fn first_text<P: PageDriver>(page: &P, selector: &str) -> Option<String> {
    let elements = match page.query_all(selector).await {
        Ok(elements) => elements,
        Err(e) => {
            tracing::debug!("Lookup of {} failed: {}", selector, e);
            return None;
        }
    };

    match elements.first()?.text().await {
        Ok(text) => Some(text.trim().to_string()),
        Err(e) => {
            tracing::debug!("Reading text of {} failed: {}", selector, e);
            None
        }
    }
}

/// Read two parallel element lists and pair them by position.
async fn read_pairs<P: PageDriver>(
    page: &P,
    label_selector: &str,
    value_selector: &str,
) -> Vec<(String, String)> {
    let labels = texts(page, label_selector).await;
    let values = texts(page, value_selector).await;

    if labels.len() != values.len() {
        tracing::debug!(
            "Feature lists differ in length ({} labels, {} values), pairing the first {}",
            labels.len(),
            values.len(),
            labels.len().min(values.len())
        );
    }
    zip_features(labels, values)
}

/// Text of every element matching `selector`; `None` marks an unreadable element.
async fn texts<P: PageDriver>(page: &P, selector: &str) -> Vec<Option<String>> {
    let elements = match page.query_all(selector).await {
        Ok(elements) => elements,
        Err(e) => {
            tracing::debug!("Lookup of {} failed: {}", selector, e);
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(elements.len());
    for element in &elements {
        out.push(element.text().await.ok());
    }
    out
}

/// Pair labels with values by position.
///
/// Stops at the shorter list. Pairs where either side could not be read or
/// the label is blank are dropped without shifting the remaining pairs.
/// Later pairs overwrite earlier ones with the same label when merged into
/// a record.
pub fn zip_features(
    labels: Vec<Option<String>>,
    values: Vec<Option<String>>,
) -> Vec<(String, String)> {
    labels
        .into_iter()
        .zip(values)
        .filter_map(|(label, value)| {
            let label = label?.trim().to_string();
            let value = value?.trim().to_string();
            (!label.is_empty()).then_some((label, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use carvest_browser::{BrowserSession, SnapshotSession};
    use carvest_core::{DelayRange, FIELD_DESCRIPTION, FIELD_LOCATION, FIELD_PRICE};

    const URL: &str = "https://bama.ir/car/detail-xyz";

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.pacing.listing_delay = DelayRange::none();
        config
    }

    fn some(items: &[&str]) -> Vec<Option<String>> {
        items.iter().map(|s| Some((*s).to_string())).collect()
    }

    async fn extract(html: &str) -> ListingRecord {
        let session = SnapshotSession::new([(URL, html)]);
        let page = session.open_page().await.unwrap();
        extract_listing(&page, URL, &config()).await.unwrap()
    }

    #[test]
    fn test_zip_stops_at_shorter_list() {
        let pairs = zip_features(some(&["Mileage", "Color", "Gearbox"]), some(&["12000", "White"]));
        assert_eq!(
            pairs,
            vec![
                ("Mileage".to_string(), "12000".to_string()),
                ("Color".to_string(), "White".to_string()),
            ]
        );
    }

    #[test]
    fn test_zip_skips_unreadable_without_shifting() {
        let labels = vec![Some("A".to_string()), None, Some(" C ".to_string()), Some("  ".to_string())];
        let values = some(&["1", "2", " 3 ", "4"]);
        assert_eq!(
            zip_features(labels, values),
            vec![
                ("A".to_string(), "1".to_string()),
                ("C".to_string(), "3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_extracts_full_listing() {
        let html = r#"
            <span class="bama-ad-detail-price__price-text"> 1,250,000,000 </span>
            <span class="address-text">Tehran</span>
            <div>
                <span data-v-23e2e990>Mileage</span><p class="dir-ltr">12,000 km</p>
                <span data-v-23e2e990>Year</span><p class="dir-ltr">1402</p>
            </div>
            <div>
                <span class="bama-vehicle-detail-with-link__row-title">Color</span>
                <span class="bama-vehicle-detail-with-link__row-text">White</span>
                <span class="bama-vehicle-detail-with-link__row-title">Year</span>
                <span class="bama-vehicle-detail-with-link__row-text">2023</span>
            </div>
            <p data-v-7980cec8>Single owner, full service history.</p>
        "#;

        let record = extract(html).await;
        assert_eq!(record.url(), URL);
        assert_eq!(record.get(FIELD_PRICE), Some("1,250,000,000"));
        assert_eq!(record.get(FIELD_LOCATION), Some("Tehran"));
        assert_eq!(record.get("Mileage"), Some("12,000 km"));
        assert_eq!(record.get("Color"), Some("White"));
        // Variable-schema list is merged after the fixed one
        assert_eq!(record.get("Year"), Some("2023"));
        assert_eq!(
            record.get(FIELD_DESCRIPTION),
            Some("Single owner, full service history.")
        );

        let keys: Vec<_> = record.keys().collect();
        assert_eq!(
            keys,
            vec!["URL", "Price", "Location", "Description", "Mileage", "Year", "Color"]
        );
    }

    #[tokio::test]
    async fn test_missing_fields_fall_back_to_sentinels() {
        let record = extract("<html><body><h1>Sold</h1></body></html>").await;
        assert_eq!(record.get(FIELD_PRICE), Some("N/A"));
        assert_eq!(record.get(FIELD_LOCATION), Some("N/A"));
        assert_eq!(record.get(FIELD_DESCRIPTION), Some("No description"));
        assert_eq!(record.field_count(), 4);
    }

    #[tokio::test]
    async fn test_custom_sentinels() {
        let mut config = config();
        config.sentinels.missing_value = "-".to_string();
        let session = SnapshotSession::new([(URL, "<p>empty</p>")]);
        let page = session.open_page().await.unwrap();

        let record = extract_listing(&page, URL, &config).await.unwrap();
        assert_eq!(record.get(FIELD_PRICE), Some("-"));
    }

    #[tokio::test]
    async fn test_invalid_selector_degrades_to_sentinel() {
        let mut config = config();
        config.selectors.price = "span[[".to_string();
        let session = SnapshotSession::new([(
            URL,
            r#"<span class="address-text">Karaj</span>"#,
        )]);
        let page = session.open_page().await.unwrap();

        let record = extract_listing(&page, URL, &config).await.unwrap();
        assert_eq!(record.get(FIELD_PRICE), Some("N/A"));
        assert_eq!(record.get(FIELD_LOCATION), Some("Karaj"));
    }

    #[tokio::test]
    async fn test_navigation_failure_fails_listing() {
        let session = SnapshotSession::new([(URL, "<p></p>")]);
        let page = session.open_page().await.unwrap();

        let result = extract_listing(&page, "https://bama.ir/car/detail-gone", &config()).await;
        assert!(result.is_err());
    }
}
