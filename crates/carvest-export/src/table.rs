//! Rectangular view over records with heterogeneous key sets.

use crate::error::{ExportError, Result};
use carvest_core::{ListingRecord, MANDATORY_FIELDS};
use std::collections::HashMap;

/// Header plus rows, every row aligned to the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given header.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Flatten records into a table.
    ///
    /// The header is the mandatory fields followed by every other key in the
    /// order it first appears. Cells for keys a record lacks are empty.
    #[must_use]
    pub fn from_records(records: &[ListingRecord]) -> Self {
        let mut columns: Vec<String> = MANDATORY_FIELDS.iter().map(|s| (*s).to_string()).collect();
        let mut index: HashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        for record in records {
            for key in record.keys() {
                if !index.contains_key(key) {
                    index.insert(key.to_string(), columns.len());
                    columns.push(key.to_string());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                let mut row = vec![String::new(); columns.len()];
                for (key, value) in record.iter() {
                    row[index[key]] = value.to_string();
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Header in column order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in table order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell lookup by row position and column name.
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Stack `later` under `earlier`.
    ///
    /// The header is the union of both, `earlier`'s columns first. Rows are
    /// realigned to the combined header.
    #[must_use]
    pub fn concat(earlier: Table, later: Table) -> Table {
        let mut columns = earlier.columns.clone();
        for column in &later.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }

        let mut combined = Table::new(columns);
        for part in [earlier, later] {
            let mapping: Vec<usize> = part
                .columns
                .iter()
                .map(|c| combined.column_index(c).unwrap_or_default())
                .collect();

            for row in part.rows {
                let mut aligned = vec![String::new(); combined.columns.len()];
                for (value, &target) in row.into_iter().zip(&mapping) {
                    aligned[target] = value;
                }
                combined.rows.push(aligned);
            }
        }
        combined
    }

    /// Keep only the last row for every distinct value of `key`.
    ///
    /// Surviving rows stay where their last occurrence was.
    pub fn dedup_keep_last(self, key: &str) -> Result<Table> {
        let col = self
            .column_index(key)
            .ok_or_else(|| ExportError::MissingKeyColumn {
                column: key.to_string(),
            })?;

        let keep: Vec<bool> = {
            let mut last: HashMap<&str, usize> = HashMap::with_capacity(self.rows.len());
            for (i, row) in self.rows.iter().enumerate() {
                last.insert(row[col].as_str(), i);
            }
            self.rows
                .iter()
                .enumerate()
                .map(|(i, row)| last.get(row[col].as_str()) == Some(&i))
                .collect()
        };

        let Table { columns, rows } = self;
        let rows = rows
            .into_iter()
            .zip(keep)
            .filter_map(|(row, keep)| keep.then_some(row))
            .collect();

        Ok(Table { columns, rows })
    }

    /// Plain-text rendering of the header and the first `n` rows.
    ///
    /// Line breaks inside cells are shown as spaces.
    #[must_use]
    pub fn preview(&self, n: usize) -> String {
        let header: Vec<String> = self.columns.iter().map(|c| single_line(c)).collect();
        let shown: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(n)
            .map(|row| row.iter().map(|c| single_line(c)).collect())
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|c| c.chars().count()).collect();
        for row in &shown {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let render = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| {
                    let pad = width - cell.chars().count();
                    format!("{cell}{}", " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut out = render(&header);
        for row in &shown {
            out.push('\n');
            out.push_str(&render(row));
        }
        if self.rows.len() > shown.len() {
            out.push_str(&format!("\n... {} more rows", self.rows.len() - shown.len()));
        }
        out
    }
}

fn single_line(cell: &str) -> String {
    cell.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
