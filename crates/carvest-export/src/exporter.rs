//! Collection-to-CSV export merged with the previous export.
//!
//! Each run flattens the current collection, stacks it under the prior CSV,
//! and keeps one row per URL, the freshly exported one winning. A missing or
//! malformed collection and a malformed prior table both abort the run, so
//! history is never silently dropped.

use crate::error::{ExportError, Result};
use crate::table::Table;
use carvest_core::{AppConfig, Collection, FIELD_URL};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Counters for one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Where the merged table was written
    pub path: PathBuf,
    /// Rows exported from the current collection
    pub exported_rows: usize,
    /// Rows read from the prior table
    pub prior_rows: usize,
    /// Rows in the merged table
    pub total_rows: usize,
    /// Columns in the merged table
    pub columns: usize,
}

/// Read the collection and flatten it into a table.
pub fn export(collection_path: &Path) -> Result<Table> {
    if !collection_path.exists() {
        return Err(ExportError::MissingCollection {
            path: collection_path.to_path_buf(),
        });
    }

    let contents = fs::read_to_string(collection_path).map_err(|source| ExportError::Io {
        path: collection_path.to_path_buf(),
        source,
    })?;
    let collection: Collection =
        serde_json::from_str(&contents).map_err(|source| ExportError::CorruptCollection {
            path: collection_path.to_path_buf(),
            source,
        })?;

    Ok(Table::from_records(collection.records()))
}

/// Read a CSV table with a header row.
///
/// Ragged rows and repeated header names are rejected.
pub fn read_table(path: &Path) -> Result<Table> {
    let corrupt = |source| ExportError::CorruptTable {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(corrupt)?;
    let columns: Vec<String> = reader
        .headers()
        .map_err(corrupt)?
        .iter()
        .map(str::to_string)
        .collect();

    let repeated = {
        let mut names = HashSet::with_capacity(columns.len());
        columns.iter().find(|c| !names.insert(c.as_str())).cloned()
    };
    if let Some(column) = repeated {
        return Err(ExportError::DuplicateColumn {
            path: path.to_path_buf(),
            column,
        });
    }

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record.map_err(corrupt)?;
        table.push_row(record.iter().map(str::to_string).collect());
    }
    Ok(table)
}

/// Merge a fresh export with the table already on disk.
///
/// Prior rows come first, then the new ones; for each URL only the last
/// row survives. Without a prior table the new rows are returned as is.
pub fn merge_with_existing(new_rows: Table, prior_table_path: &Path) -> Result<Table> {
    let prior = if prior_table_path.exists() {
        Some(read_table(prior_table_path)?)
    } else {
        tracing::debug!(
            "No prior table at {}, nothing to merge",
            prior_table_path.display()
        );
        None
    };
    merge_tables(prior, new_rows)
}

/// Stack `new_rows` under `prior` and keep the last row per URL.
pub fn merge_tables(prior: Option<Table>, new_rows: Table) -> Result<Table> {
    let Some(prior) = prior else {
        return Ok(new_rows);
    };

    if prior.column_index(FIELD_URL).is_none() {
        return Err(ExportError::MissingKeyColumn {
            column: FIELD_URL.to_string(),
        });
    }
    tracing::debug!(
        "Merging {} new rows with {} prior rows",
        new_rows.len(),
        prior.len()
    );

    Table::concat(prior, new_rows).dedup_keep_last(FIELD_URL)
}

/// Overwrite `path` with the table as CSV.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp = temp_path(path);
    let written = write_csv(table, &tmp).and_then(|()| {
        fs::rename(&tmp, path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })
    });

    if written.is_err() {
        if let Err(e) = fs::remove_file(&tmp) {
            tracing::debug!("Could not remove {}: {}", tmp.display(), e);
        }
    }
    written
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "table.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Runs export, merge and write against configured locations.
#[derive(Debug, Clone)]
pub struct Exporter {
    table_path: PathBuf,
    preview_rows: usize,
}

impl Exporter {
    /// Create an exporter writing to `table_path`.
    #[must_use]
    pub fn new(table_path: impl Into<PathBuf>, preview_rows: usize) -> Self {
        Self {
            table_path: table_path.into(),
            preview_rows,
        }
    }

    /// Create an exporter from the application config.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.storage.table_path.clone(),
            config.export.preview_rows,
        )
    }

    /// Export the collection, merge with history, and rewrite the table.
    pub fn run(&self, collection_path: &Path) -> Result<ExportSummary> {
        let fresh = export(collection_path)?;
        let exported_rows = fresh.len();

        let prior = if self.table_path.exists() {
            Some(read_table(&self.table_path)?)
        } else {
            None
        };
        let prior_rows = prior.as_ref().map_or(0, Table::len);

        let merged = merge_tables(prior, fresh)?;
        write_table(&merged, &self.table_path)?;

        tracing::info!(
            "Table updated and saved to {} ({} rows, {} columns)",
            self.table_path.display(),
            merged.len(),
            merged.columns().len()
        );
        tracing::info!("Preview:\n{}", merged.preview(self.preview_rows));

        Ok(ExportSummary {
            path: self.table_path.clone(),
            exported_rows,
            prior_rows,
            total_rows: merged.len(),
            columns: merged.columns().len(),
        })
    }
}
