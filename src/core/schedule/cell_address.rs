// Cell addresses in spreadsheet "A1" notation.
//
// Columns use bijective base-26: there is no zero digit, so A=1, Z=26,
// AA=27, AZ=52, BA=53 and so on. Rows are plain 1-based integers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),
}

/// A single cell, 1-based in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    row: u32,
    col: u32,
}

impl CellAddress {
    pub fn new(row: u32, col: u32) -> Result<Self, AddressError> {
        if row < 1 || col < 1 {
            return Err(AddressError::InvalidAddress(format!("({row}, {col})")));
        }
        Ok(Self { row, col })
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    pub fn parse(a1: &str) -> Result<Self, AddressError> {
        let (row, col) = decode(a1)?;
        Ok(Self { row, col })
    }

    pub fn to_a1(&self) -> String {
        format!("{}{}", column_letters(self.col), self.row)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

impl std::str::FromStr for CellAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Encodes a (row, column) pair as `"{letters}{row}"`.
pub fn encode(row: i64, col: i64) -> Result<String, AddressError> {
    let invalid = || AddressError::InvalidAddress(format!("({row}, {col})"));
    let row = u32::try_from(row).map_err(|_| invalid())?;
    let col = u32::try_from(col).map_err(|_| invalid())?;
    Ok(CellAddress::new(row, col)?.to_a1())
}

/// Decodes `"AB12"` into `(12, 28)`.
pub fn decode(address: &str) -> Result<(u32, u32), AddressError> {
    let invalid = || AddressError::InvalidAddress(address.to_string());

    let split = address
        .find(|c: char| !c.is_ascii_uppercase())
        .ok_or_else(invalid)?;
    let (letters, digits) = address.split_at(split);

    if letters.is_empty() || digits.is_empty() {
        return Err(invalid());
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) || digits.starts_with('0') {
        return Err(invalid());
    }

    let col = column_number(letters)?;
    let row: u32 = digits.parse().map_err(|_| invalid())?;
    Ok((row, col))
}

/// Converts a 1-based column index to its letters. Zero yields an empty string.
pub fn column_letters(col: u32) -> String {
    let mut letters = Vec::new();
    let mut div = col;

    while div > 0 {
        let mut rem = div % 26;
        div /= 26;
        if rem == 0 {
            rem = 26;
            div -= 1;
        }
        letters.push(b'A' + (rem as u8) - 1);
    }

    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Converts column letters (`"A"`, `"AA"`, ...) back to a 1-based index.
pub fn column_number(letters: &str) -> Result<u32, AddressError> {
    let invalid = || AddressError::InvalidAddress(letters.to_string());

    if letters.is_empty() {
        return Err(invalid());
    }

    let mut acc: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_uppercase() {
            return Err(invalid());
        }
        let digit = u32::from(b - b'A') + 1;
        acc = acc
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(invalid)?;
    }
    Ok(acc)
}
