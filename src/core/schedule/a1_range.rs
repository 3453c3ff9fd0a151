// Range strings as the Sheets API sends and receives them:
// `Sheet1!B5`, `'My Sheet'!A5:Q`, `'計算結果'!B5:B6`, `C3`.

use super::cell_address::{column_letters, column_number, AddressError, CellAddress};
use std::fmt;

/// Right-hand side of a range. `row: None` means open-ended (every row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEnd {
    pub col: u32,
    pub row: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub sheet: Option<String>,
    pub start: CellAddress,
    pub end: Option<RangeEnd>,
}

impl A1Range {
    pub fn cell(sheet: Option<&str>, start: CellAddress) -> Self {
        Self {
            sheet: sheet.map(str::to_string),
            start,
            end: None,
        }
    }

    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let invalid = || AddressError::InvalidAddress(input.to_string());

        let (sheet, cells) = match input.rfind('!') {
            Some(pos) => (Some(unquote_sheet_name(&input[..pos])), &input[pos + 1..]),
            None => (None, input),
        };
        if sheet.as_deref() == Some("") {
            return Err(invalid());
        }

        let (start, end) = match cells.split_once(':') {
            Some((start, end)) => (start, Some(end)),
            None => (cells, None),
        };

        let start = CellAddress::parse(start)?;
        let end = match end {
            None => None,
            Some(end) => Some(parse_range_end(end).ok_or_else(invalid)?),
        };

        Ok(Self { sheet, start, end })
    }

    /// Last column covered by the range.
    pub fn last_col(&self) -> u32 {
        self.end.map(|e| e.col).unwrap_or(self.start.col())
    }

    /// Last row covered, or `None` when the range runs to the bottom of the sheet.
    pub fn last_row(&self) -> Option<u32> {
        match self.end {
            Some(end) => end.row,
            None => Some(self.start.row()),
        }
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{}!", quote_sheet_name(sheet))?;
        }
        write!(f, "{}", self.start)?;
        if let Some(end) = self.end {
            write!(f, ":{}", column_letters(end.col))?;
            if let Some(row) = end.row {
                write!(f, "{row}")?;
            }
        }
        Ok(())
    }
}

fn parse_range_end(end: &str) -> Option<RangeEnd> {
    if end.bytes().all(|b| b.is_ascii_uppercase()) {
        let col = column_number(end).ok()?;
        return Some(RangeEnd { col, row: None });
    }
    let cell = CellAddress::parse(end).ok()?;
    Some(RangeEnd {
        col: cell.col(),
        row: Some(cell.row()),
    })
}

/// Wraps a sheet name in single quotes, doubling any embedded quote.
pub fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Strips the quoting added by [`quote_sheet_name`]. Bare names pass through.
pub fn unquote_sheet_name(name: &str) -> String {
    if name.len() >= 2 && name.starts_with('\'') && name.ends_with('\'') {
        name[1..name.len() - 1].replace("''", "'")
    } else {
        name.to_string()
    }
}
