// The spreadsheet backend as the schedule service sees it.
//
// This is the "port": core only knows these three calls and the Sheets v4
// value-range shapes. `infra` provides the REST client and an in-memory sheet.

use super::reconcile::UpdateRecord;
use super::search_range::SearchRange;
use super::sparse_table::CellValue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetStoreError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid range '{0}'")]
    InvalidRange(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// How the backend interprets written strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueInputOption {
    Raw,
    /// Parsed as if typed into the UI: formulas run, dates become dates.
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<CellValue>>,
}

impl ValueRange {
    pub fn single(range: impl Into<String>, value: CellValue) -> Self {
        Self {
            range: range.into(),
            major_dimension: None,
            values: vec![vec![value]],
        }
    }
}

/// Body of `values:batchUpdate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateRequest {
    pub data: Vec<ValueRange>,
    pub value_input_option: ValueInputOption,
}

impl BatchUpdateRequest {
    /// Flattens several batches of updates into one request on the anchor's sheet.
    ///
    /// A cell named by more than one record keeps the first value.
    pub fn from_batches<B>(anchor: &SearchRange, batches: B) -> Self
    where
        B: IntoIterator,
        B::Item: IntoIterator<Item = UpdateRecord>,
    {
        let mut seen = HashSet::new();
        let mut data = Vec::new();

        for record in batches.into_iter().flatten() {
            if !seen.insert(record.address) {
                tracing::debug!(cell = %record.address, "Dropping repeated update");
                continue;
            }
            data.push(ValueRange::single(anchor.qualify(&record.address), record.value));
        }

        Self {
            data,
            value_input_option: ValueInputOption::UserEntered,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub total_updated_rows: u64,
    #[serde(default)]
    pub total_updated_columns: u64,
    #[serde(default)]
    pub total_updated_cells: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    #[serde(default)]
    pub updated_range: String,
    #[serde(default)]
    pub updated_rows: u64,
    #[serde(default)]
    pub updated_cells: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_data: Option<ValueRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    #[serde(default)]
    pub table_range: Option<String>,
    #[serde(default)]
    pub updates: UpdateValuesResponse,
}

/// A handle on one spreadsheet.
#[async_trait]
pub trait SpreadsheetStore: Send + Sync {
    /// Reads a range. Trailing empty rows and cells are omitted, as the Sheets API does.
    async fn get_values(&self, range: &str) -> Result<ValueRange, SheetStoreError>;

    /// Appends rows after the table found at `range`, inserting new rows.
    async fn append_values(
        &self,
        range: &str,
        rows: Vec<Vec<CellValue>>,
        option: ValueInputOption,
    ) -> Result<AppendValuesResponse, SheetStoreError>;

    /// Writes every range in the request in one call.
    async fn batch_update(
        &self,
        request: &BatchUpdateRequest,
    ) -> Result<BatchUpdateResponse, SheetStoreError>;
}
