//! Tabular data and table-creation requests

use crate::document::Table;
use crate::error::DocsError;
use crate::ops::EditOperation;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Rectangular dataset with a header row, every cell already text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularData {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TabularData {
    /// Create dataset from header and data rows
    ///
    /// # Errors
    /// - `DocsError::InvalidTable` if the header is empty or a row has a
    ///   different width than the header
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DocsError> {
        if header.is_empty() {
            return Err(DocsError::InvalidTable(
                "table needs at least one column".to_string(),
            ));
        }
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != header.len())
        {
            return Err(DocsError::InvalidTable(format!(
                "row {i} has {} cells, header has {}",
                row.len(),
                header.len()
            )));
        }
        Ok(Self { header, rows })
    }

    /// Create dataset by stringifying every header and data cell
    ///
    /// # Errors
    /// Same as [`TabularData::new`]
    pub fn from_display<H, R, C>(header: H, rows: R) -> Result<Self, DocsError>
    where
        H: IntoIterator,
        H::Item: Display,
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Display,
    {
        let header = header.into_iter().map(|h| h.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| c.to_string()).collect())
            .collect();
        Self::new(header, rows)
    }

    /// Header row
    #[inline]
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Column count
    #[inline]
    #[must_use]
    pub fn columns(&self) -> usize {
        self.header.len()
    }

    /// Row count including the header
    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows.len() + 1
    }

    /// Full cell matrix, header first
    #[must_use]
    pub fn values(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    /// Table-creation request for this dataset
    #[must_use]
    pub fn to_request(&self, append: bool) -> TableRequest {
        TableRequest {
            rows: self.rows(),
            columns: self.columns(),
            append,
            values: self.values(),
        }
    }
}

/// Request for the table-creation endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRequest {
    /// Row count including the header
    pub rows: usize,
    /// Column count
    pub columns: usize,
    /// Append at end of body; `false` replaces the body
    pub append: bool,
    /// Cell matrix, header first
    pub values: Vec<Vec<String>>,
}

/// Insertions that fill an empty table with `values`
///
/// Ordered by descending index so that no insertion shifts the target of
/// a later one in the same batch. Empty cells are skipped.
#[must_use]
pub fn cell_fill_operations(table: &Table, values: &[Vec<String>]) -> Vec<EditOperation> {
    let mut fills: Vec<(i64, &str)> = table
        .table_rows
        .iter()
        .zip(values)
        .flat_map(|(row, row_values)| row.table_cells.iter().zip(row_values))
        .filter(|(_, text)| !text.is_empty())
        .filter_map(|(cell, text)| {
            cell.content
                .first()
                .and_then(|element| element.start_index)
                .map(|index| (index, text.as_str()))
        })
        .collect();

    fills.sort_by(|a, b| b.0.cmp(&a.0));
    fills
        .into_iter()
        .map(|(index, text)| EditOperation::insert_text(index, text))
        .collect()
}
