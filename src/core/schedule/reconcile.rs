// Diff between the schedule sheet as it stands and freshly computed values.
//
// The sheet is treated as write-once per cell: a value is only written into a
// cell that is currently empty, and only when the fresh value is non-empty.
// Rows and columns are never added or removed here.

use super::cell_address::{AddressError, CellAddress};
use super::search_range::SearchRange;
use super::sparse_table::{CellValue, SparseTable};
use serde::Serialize;

/// One cell slated for the batched write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateRecord {
    pub address: CellAddress,
    pub value: CellValue,
}

/// Collects the cells of `old` that should take their value from `new`.
///
/// Row `i` of `old` (0-based, header excluded) lands on sheet row
/// `anchor.first_row + 1 + i`. Each column lands on the physical column
/// recorded for it in `old`. Keys or columns missing from `new` are skipped.
pub fn diff(
    anchor: &SearchRange,
    old: &SparseTable,
    new: &SparseTable,
) -> Result<Vec<UpdateRecord>, AddressError> {
    let first_data_row = anchor
        .first_row
        .checked_add(1)
        .ok_or_else(|| AddressError::InvalidAddress(anchor.to_string()))?;

    let columns: Vec<(&str, u32)> = old.columns().collect();
    let mut updates = Vec::new();

    for (row_offset, row) in old.rows().enumerate() {
        if !new.contains_row(&row.key) {
            continue;
        }

        for ((column, position), old_value) in columns.iter().zip(&row.cells) {
            let Some(new_value) = new.get(&row.key, column) else {
                continue;
            };
            if !new_value.is_filled() || old_value.is_filled() {
                continue;
            }

            let sheet_row = u32::try_from(row_offset)
                .ok()
                .and_then(|offset| first_data_row.checked_add(offset))
                .ok_or_else(|| AddressError::InvalidAddress(format!("row offset {row_offset}")))?;

            updates.push(UpdateRecord {
                address: CellAddress::new(sheet_row, *position)?,
                value: new_value.clone(),
            });
        }
    }

    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(s: &str) -> SearchRange {
        SearchRange::parse(s).unwrap()
    }

    fn table(origin: u32, columns: &[&str], rows: &[(&str, &[&str])]) -> SparseTable {
        let mut table = SparseTable::new(origin, columns.iter().copied());
        for (key, cells) in rows {
            table.push_row(*key, cells.iter().map(|c| CellValue::from(*c)).collect());
        }
        table
    }

    #[test]
    fn populated_cells_are_never_overwritten() {
        let old = table(1, &["c1"], &[("K1", &["X"])]);
        let new = table(1, &["c1"], &[("K1", &["Y"])]);

        let updates = diff(&anchor("Sheet1!A5"), &old, &new).unwrap();
        assert!(updates.is_empty());
    }

    #[test]
    fn empty_cells_are_filled() {
        let old = table(1, &["c1"], &[("K1", &[""])]);
        let new = table(1, &["c1"], &[("K1", &["Y"])]);

        let updates = diff(&anchor("Sheet1!A5"), &old, &new).unwrap();
        assert_eq!(
            updates,
            vec![UpdateRecord {
                address: CellAddress::parse("A6").unwrap(),
                value: CellValue::from("Y"),
            }]
        );
    }

    #[test]
    fn keys_missing_from_new_are_ignored() {
        let old = table(1, &["c1", "c2"], &[("K1", &["", ""])]);
        let new = table(1, &["c1", "c2"], &[("K2", &["Y", "Z"])]);

        assert!(diff(&anchor("Sheet1!A5"), &old, &new).unwrap().is_empty());
    }

    #[test]
    fn columns_missing_from_new_are_ignored() {
        let old = table(1, &["c1", "c2"], &[("K1", &["", ""])]);
        let new = table(1, &["c2"], &[("K1", &["Z"])]);

        let updates = diff(&anchor("Sheet1!A5"), &old, &new).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].address.to_string(), "B6");
        assert_eq!(updates[0].value, CellValue::from("Z"));
    }

    #[test]
    fn empty_new_values_contribute_nothing() {
        let old = table(1, &["c1"], &[("K1", &[""])]);
        let mut new = SparseTable::new(1, ["c1"]);
        new.push_row("K1", vec![CellValue::from(0.0)]);

        assert!(diff(&anchor("Sheet1!A5"), &old, &new).unwrap().is_empty());
    }

    #[test]
    fn end_to_end_scenario_from_anchor_b5() {
        let old = table(2, &["price"], &[("K1", &[""]), ("K2", &[""])]);
        let new = table(1, &["price"], &[("K1", &["100"]), ("K2", &[""])]);

        let updates = diff(&anchor("Sheet1!B5"), &old, &new).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].address.to_string(), "B6");
        assert_eq!(updates[0].value, CellValue::from("100"));
    }

    #[test]
    fn destination_follows_row_position_and_physical_column() {
        // Blank row in the middle still occupies a sheet row.
        let old = table(
            3,
            &["図番", "納期", "金額(税抜)"],
            &[("MA-0001", &["MA-0001", "", ""]), ("", &[]), ("MA-0003", &["MA-0003", "1/5", ""])],
        );
        let new = table(
            1,
            &["金額(税抜)", "納期"],
            &[("MA-0003", &["54000", "2/1"]), ("MA-0001", &["", "12/31"])],
        );

        let updates = diff(&anchor("Sheet1!C10"), &old, &new).unwrap();
        let got: Vec<_> = updates
            .iter()
            .map(|u| (u.address.to_string(), u.value.to_string()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("D11".to_string(), "12/31".to_string()),
                ("E13".to_string(), "54000".to_string()),
            ]
        );
    }
}
