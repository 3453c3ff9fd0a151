use super::a1_range::{quote_sheet_name, unquote_sheet_name};
use super::cell_address::{column_number, AddressError, CellAddress};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static SEARCH_RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<sheet>.*)!(?P<column>[A-Z]+)(?P<row>\d+)$")
        .expect("search range pattern is valid")
});

#[derive(Debug, Error)]
pub enum SearchRangeError {
    #[error("Not a search range (expected `Sheet!A5`): {0}")]
    NoMatch(String),

    #[error(transparent)]
    Address(#[from] AddressError),
}

/// The top-left anchor of the schedule table, e.g. `22年1月～12月!A5`.
///
/// The anchor row holds the column headers. Data rows start one below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRange {
    pub sheet_name: String,
    pub first_column: String,
    pub first_row: u32,
}

impl SearchRange {
    pub fn parse(input: &str) -> Result<Self, SearchRangeError> {
        let caps = SEARCH_RANGE_PATTERN
            .captures(input)
            .ok_or_else(|| SearchRangeError::NoMatch(input.to_string()))?;

        let first_column = caps["column"].to_string();
        let first_row: u32 = caps["row"]
            .parse()
            .map_err(|_| AddressError::InvalidAddress(input.to_string()))?;

        // Validates both halves: row >= 1 and letters within u32.
        CellAddress::new(first_row, column_number(&first_column)?)?;

        Ok(Self {
            sheet_name: unquote_sheet_name(&caps["sheet"]),
            first_column,
            first_row,
        })
    }

    pub fn first_column_index(&self) -> Result<u32, AddressError> {
        column_number(&self.first_column)
    }

    pub fn anchor(&self) -> Result<CellAddress, AddressError> {
        CellAddress::new(self.first_row, self.first_column_index()?)
    }

    /// Open-ended range from the anchor across to `right_column`, covering every row.
    pub fn table_range(&self, right_column: &str) -> String {
        format!(
            "{}!{}{}:{}",
            quote_sheet_name(&self.sheet_name),
            self.first_column,
            self.first_row,
            right_column
        )
    }

    /// The anchor's sheet name prefixed onto a single cell.
    pub fn qualify(&self, address: &CellAddress) -> String {
        format!("{}!{}", quote_sheet_name(&self.sheet_name), address)
    }
}

impl fmt::Display for SearchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{}{}",
            quote_sheet_name(&self.sheet_name),
            self.first_column,
            self.first_row
        )
    }
}

impl std::str::FromStr for SearchRange {
    type Err = SearchRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
