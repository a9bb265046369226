//! Persisted JSON collection.
//!
//! The collection is read once at the start of a run and written once at
//! the end. Writes go to a sibling temporary file that is renamed over the
//! target, so a crash mid-write never leaves a truncated collection behind.

use crate::error::{CollectorError, Result};
use carvest_core::Collection;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Read the persisted collection, or start empty if there is none yet.
///
/// A missing file is the normal first-run state. A file that exists but
/// cannot be read or parsed is an error, so a run never replaces it with a
/// fresh, smaller collection.
pub fn load_existing_collection(path: &Path) -> Result<Collection> {
    if !path.exists() {
        tracing::info!("No collection at {}, starting empty", path.display());
        return Ok(Collection::new());
    }

    let contents = fs::read_to_string(path).map_err(|source| CollectorError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let collection: Collection =
        serde_json::from_str(&contents).map_err(|source| CollectorError::CorruptCollection {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(
        "Loaded {} listings from {}",
        collection.len(),
        path.display()
    );
    Ok(collection)
}

/// Overwrite the persisted collection with the full in-memory state.
pub fn persist_collection(path: &Path, collection: &Collection) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CollectorError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    collection.serialize(&mut serializer)?;
    buf.push(b'\n');

    let tmp = temp_path(path);
    let written = fs::write(&tmp, &buf)
        .map_err(|source| CollectorError::Io {
            path: tmp.clone(),
            source,
        })
        .and_then(|()| {
            fs::rename(&tmp, path).map_err(|source| CollectorError::Io {
                path: path.to_path_buf(),
                source,
            })
        });
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            tracing::debug!("Could not remove {}: {}", tmp.display(), cleanup);
        }
        return Err(e);
    }

    tracing::info!(
        "Saved {} listings to {}",
        collection.len(),
        path.display()
    );
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "collection.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carvest_core::ListingRecord;
    use tempfile::TempDir;

    fn sample() -> Collection {
        let mut first = ListingRecord::new("https://bama.ir/car/detail-1", "۱۲۰", "تهران", "N/A");
        first.merge_features(vec![("رنگ".to_string(), "سفید".to_string())]);
        let second = ListingRecord::new("https://bama.ir/car/detail-2", "90", "Karaj", "Clean");
        Collection::from_records(vec![first, second])
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let collection = load_existing_collection(&tmp.path().join("cars.json")).unwrap();
        assert!(collection.is_empty());
    }

    #[test]
    fn test_persist_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("cars.json");

        persist_collection(&path, &sample()).unwrap();
        let loaded = load_existing_collection(&path).unwrap();

        assert_eq!(loaded, sample());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_output_is_readable_utf8_with_four_space_indent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cars.json");
        persist_collection(&path, &sample()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"رنگ\": \"سفید\""));
        assert!(text.contains("\n        \"URL\": \"https://bama.ir/car/detail-1\""));
    }

    #[test]
    fn test_persist_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cars.json");

        persist_collection(&path, &sample()).unwrap();
        let first = fs::read(&path).unwrap();
        persist_collection(&path, &load_existing_collection(&path).unwrap()).unwrap();
        assert_eq!(first, fs::read(&path).unwrap());
    }

    #[test]
    fn test_failed_persist_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        // A non-empty directory at the target path makes the rename fail
        let path = tmp.path().join("cars.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let err = persist_collection(&path, &sample()).unwrap_err();
        assert!(matches!(err, CollectorError::Io { .. }));
        assert!(!temp_path(&path).exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cars.json");
        fs::write(&path, "[{\"Price\": \"100\"}]").unwrap();

        let err = load_existing_collection(&path).unwrap_err();
        assert!(matches!(err, CollectorError::CorruptCollection { .. }));

        fs::write(&path, "not json").unwrap();
        assert!(load_existing_collection(&path).is_err());
    }
}
