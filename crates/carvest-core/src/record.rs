//! Listing records and the deduplicated collection they live in.
//!
//! A [`ListingRecord`] is an ordered field map: four mandatory fields followed
//! by whatever feature pairs a detail page exposed. Records from different
//! listings rarely share the same feature keys, so there is no fixed schema
//! beyond the mandatory fields. Key order is insertion order and survives a
//! JSON round trip.

use crate::error::RecordError;
use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

/// Canonical detail-page address, the sole deduplication key.
pub const FIELD_URL: &str = "URL";
/// Asking price as displayed on the listing.
pub const FIELD_PRICE: &str = "Price";
/// Seller location as displayed on the listing.
pub const FIELD_LOCATION: &str = "Location";
/// Free-text description.
pub const FIELD_DESCRIPTION: &str = "Description";

/// Fields every freshly extracted record carries, in output order.
pub const MANDATORY_FIELDS: [&str; 4] = [FIELD_URL, FIELD_PRICE, FIELD_LOCATION, FIELD_DESCRIPTION];

/// Extracted field set for one listing.
///
/// Equality compares field values, not key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    fields: IndexMap<String, String>,
}

impl ListingRecord {
    /// Create a record holding only the mandatory fields.
    pub fn new(
        url: impl Into<String>,
        price: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut fields = IndexMap::with_capacity(MANDATORY_FIELDS.len());
        fields.insert(FIELD_URL.to_string(), url.into());
        fields.insert(FIELD_PRICE.to_string(), price.into());
        fields.insert(FIELD_LOCATION.to_string(), location.into());
        fields.insert(FIELD_DESCRIPTION.to_string(), description.into());
        Self { fields }
    }

    /// Build a record from raw field pairs.
    ///
    /// Repeated keys collapse into one entry holding the last value. Only the
    /// `URL` field is required.
    pub fn from_fields(
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, RecordError> {
        Self::from_map(pairs.into_iter().collect())
    }

    fn from_map(fields: IndexMap<String, String>) -> Result<Self, RecordError> {
        match fields.get(FIELD_URL) {
            None => Err(RecordError::MissingUrl),
            Some(url) if url.trim().is_empty() => Err(RecordError::EmptyUrl),
            Some(_) => Ok(Self { fields }),
        }
    }

    /// The record's deduplication key.
    #[must_use]
    pub fn url(&self) -> &str {
        // Both constructors guarantee the URL field exists.
        self.get(FIELD_URL).unwrap_or_default()
    }

    /// Look up a field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Set a field, overwriting in place if the key already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Append feature pairs after the mandatory fields.
    ///
    /// A feature named like a mandatory field is ignored so a page cannot
    /// rewrite the record's URL or sentinels. Returns the number of pairs
    /// that were ignored.
    pub fn merge_features(&mut self, features: impl IntoIterator<Item = (String, String)>) -> usize {
        let mut ignored = 0;
        for (key, value) in features {
            if MANDATORY_FIELDS.contains(&key.as_str()) {
                tracing::debug!("Ignoring feature that shadows mandatory field {}", key);
                ignored += 1;
                continue;
            }
            self.fields.insert(key, value);
        }
        ignored
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Field pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields, mandatory ones included.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

impl Serialize for ListingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ListingRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let fields = raw
            .into_iter()
            .map(|(key, value)| (key, value_to_text(value)))
            .collect();
        Self::from_map(fields).map_err(de::Error::custom)
    }
}

/// Render a JSON value as the text a cell would show.
fn value_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Ordered set of records with pairwise distinct URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    records: Vec<ListingRecord>,
    seen: HashSet<String>,
}

impl Collection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection, keeping the first record for any repeated URL.
    #[must_use]
    pub fn from_records(records: Vec<ListingRecord>) -> Self {
        let mut collection = Self::new();
        let mut dropped = 0usize;
        for record in records {
            if !collection.push(record) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::warn!("Dropped {} records with repeated URLs", dropped);
        }
        collection
    }

    /// Whether a record with this URL is already present.
    #[must_use]
    pub fn contains_url(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Append a record and mark its URL seen.
    ///
    /// Returns `false` and leaves the collection untouched if the URL is
    /// already present.
    pub fn push(&mut self, record: ListingRecord) -> bool {
        if !self.seen.insert(record.url().to_string()) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the collection, yielding its records.
    #[must_use]
    pub fn into_records(self) -> Vec<ListingRecord> {
        self.records
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<ListingRecord>::deserialize(deserializer).map(Self::from_records)
    }
}
