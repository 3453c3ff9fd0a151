// The schedule sheet as a keyed table.
//
// Columns are an ordered list of (name, physical column index) pairs, so the
// position a cell is written back to never depends on map iteration order.
// Rows keep the order they were read in, blank rows and repeated keys
// included, because their position is what maps them back to sheet rows.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// A scalar cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// Whether the cell holds something worth keeping: non-empty text or a non-zero number.
    pub fn is_filled(&self) -> bool {
        match self {
            CellValue::Text(s) => !s.is_empty(),
            CellValue::Number(n) => *n != 0.0,
            CellValue::Empty => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Table has no header row")]
    MissingHeader,

    #[error("Key column '{0}' is not in the header")]
    UnknownKeyColumn(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub key: String,
    /// One value per table column, in column order.
    pub cells: Vec<CellValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseTable {
    columns: IndexMap<String, u32>,
    rows: Vec<TableRow>,
    row_index: HashMap<String, usize>,
}

impl SparseTable {
    /// An empty table whose columns sit at `origin_column`, `origin_column + 1`, ...
    pub fn new<I, S>(origin_column: u32, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns = IndexMap::new();
        let mut position = origin_column;
        for name in names {
            let name = name.into();
            if columns.contains_key(&name) {
                tracing::warn!(column = %name, "Duplicate column name ignored");
            } else {
                columns.insert(name, position);
            }
            position += 1;
        }

        Self {
            columns,
            rows: Vec::new(),
            row_index: HashMap::new(),
        }
    }

    /// Builds a table from raw sheet rows read starting at `origin_column`.
    ///
    /// The first row names the columns. Each following row is keyed by the
    /// value under `key_column`, or by its first cell when no key column is given.
    pub fn from_sheet_rows(
        origin_column: u32,
        rows: Vec<Vec<CellValue>>,
        key_column: Option<&str>,
    ) -> Result<Self, TableError> {
        let mut rows = rows.into_iter();
        let header = rows.next().ok_or(TableError::MissingHeader)?;

        let mut table = Self::new(origin_column, header.iter().map(ToString::to_string));
        if table.columns.is_empty() {
            return Err(TableError::MissingHeader);
        }

        let key_offset = match key_column {
            Some(name) => {
                let position = table
                    .columns
                    .get(name)
                    .ok_or_else(|| TableError::UnknownKeyColumn(name.to_string()))?;
                (position - origin_column) as usize
            }
            None => 0,
        };

        for raw in rows {
            let key = raw.get(key_offset).map(ToString::to_string).unwrap_or_default();
            let cells = table
                .columns
                .values()
                .map(|position| {
                    raw.get((position - origin_column) as usize)
                        .cloned()
                        .unwrap_or_default()
                })
                .collect();
            table.push_row(key, cells);
        }

        Ok(table)
    }

    /// Appends a row. `cells` is padded or truncated to the column count.
    pub fn push_row(&mut self, key: impl Into<String>, mut cells: Vec<CellValue>) {
        let key = key.into();
        cells.resize(self.columns.len(), CellValue::Empty);
        self.row_index.entry(key.clone()).or_insert(self.rows.len());
        self.rows.push(TableRow { key, cells });
    }

    /// Sets one cell, appending a new row for an unseen key. Unknown columns are ignored.
    pub fn set(&mut self, key: &str, column: &str, value: CellValue) {
        let Some(col_idx) = self.columns.get_index_of(column) else {
            return;
        };
        let row_idx = match self.row_index.get(key) {
            Some(idx) => *idx,
            None => {
                self.push_row(key, Vec::new());
                self.rows.len() - 1
            }
        };
        self.rows[row_idx].cells[col_idx] = value;
    }

    pub fn get(&self, key: &str, column: &str) -> Option<&CellValue> {
        let row = self.row(key)?;
        let col_idx = self.columns.get_index_of(column)?;
        row.cells.get(col_idx)
    }

    /// First row with this key.
    pub fn row(&self, key: &str) -> Option<&TableRow> {
        self.row_index.get(key).map(|idx| &self.rows[*idx])
    }

    pub fn contains_row(&self, key: &str) -> bool {
        self.row_index.contains_key(key)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names with their physical (1-based) sheet column, left to right.
    pub fn columns(&self) -> impl Iterator<Item = (&str, u32)> {
        self.columns.iter().map(|(name, pos)| (name.as_str(), *pos))
    }

    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
