// In-memory implementation of SpreadsheetStore.
//
// Behaves like the Sheets value endpoints closely enough for the schedule
// service: reads drop trailing empty rows and cells, appends land below the
// last occupied row, and a batch update writes every range or none.
// Used by tests and for dry runs against a copy of the sheet.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::schedule::a1_range::quote_sheet_name;
use crate::core::schedule::cell_address::column_letters;
use crate::core::schedule::{
    A1Range, AppendValuesResponse, BatchUpdateRequest, BatchUpdateResponse, CellAddress,
    CellValue, SheetStoreError, SpreadsheetStore, UpdateValuesResponse, ValueInputOption,
    ValueRange,
};

type Grid = Vec<Vec<CellValue>>;

pub struct InMemorySpreadsheet {
    spreadsheet_id: String,
    /// Sheet name -> rows, 0-based.
    sheets: DashMap<String, Grid>,
    batch_updates: AtomicUsize,
}

impl InMemorySpreadsheet {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheets: DashMap::new(),
            batch_updates: AtomicUsize::new(0),
        }
    }

    /// Writes `rows` with their top-left cell at `top_left`, creating the sheet if needed.
    pub fn put_rows(&self, sheet: &str, top_left: CellAddress, rows: Vec<Vec<CellValue>>) {
        let mut grid = self.sheets.entry(sheet.to_string()).or_default();
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                write_cell(
                    &mut grid,
                    top_left.row() as usize - 1 + r,
                    top_left.col() as usize - 1 + c,
                    value,
                );
            }
        }
    }

    /// Current value at `a1`, `Empty` when unset.
    pub fn cell(&self, sheet: &str, a1: &str) -> CellValue {
        let Ok(address) = CellAddress::parse(a1) else {
            return CellValue::Empty;
        };
        self.sheets
            .get(sheet)
            .and_then(|grid| {
                grid.get(address.row() as usize - 1)
                    .and_then(|row| row.get(address.col() as usize - 1))
                    .cloned()
            })
            .unwrap_or_default()
    }

    /// How many batch updates have been received.
    pub fn batch_update_calls(&self) -> usize {
        self.batch_updates.load(Ordering::SeqCst)
    }

    fn resolve(&self, range: &str) -> Result<(String, A1Range), SheetStoreError> {
        let parsed =
            A1Range::parse(range).map_err(|_| SheetStoreError::InvalidRange(range.to_string()))?;
        let sheet = parsed
            .sheet
            .clone()
            .ok_or_else(|| SheetStoreError::InvalidRange(range.to_string()))?;
        if !self.sheets.contains_key(&sheet) {
            return Err(SheetStoreError::Api {
                status: 400,
                message: format!("Unable to parse range: {}", range),
            });
        }
        Ok((sheet, parsed))
    }
}

fn has_content(value: &CellValue) -> bool {
    !matches!(value, CellValue::Empty) && value != &CellValue::from("")
}

fn write_cell(grid: &mut Grid, row: usize, col: usize, value: CellValue) {
    if grid.len() <= row {
        grid.resize_with(row + 1, Vec::new);
    }
    let cells = &mut grid[row];
    if cells.len() <= col {
        cells.resize(col + 1, CellValue::Empty);
    }
    cells[col] = value;
}

/// Last row (1-based) at or below `from_row` holding any content.
fn last_occupied_row(grid: &Grid, from_row: u32) -> Option<u32> {
    grid.iter()
        .enumerate()
        .skip(from_row as usize - 1)
        .filter(|(_, row)| row.iter().any(has_content))
        .map(|(idx, _)| idx as u32 + 1)
        .last()
}

#[async_trait]
impl SpreadsheetStore for InMemorySpreadsheet {
    async fn get_values(&self, range: &str) -> Result<ValueRange, SheetStoreError> {
        let (sheet, parsed) = self.resolve(range)?;
        let grid = self.sheets.get(&sheet).map(|g| g.value().clone()).unwrap_or_default();

        let first_row = parsed.start.row() as usize - 1;
        let first_col = parsed.start.col() as usize - 1;
        let last_col = parsed.last_col() as usize;
        let last_row = parsed
            .last_row()
            .map(|r| r as usize)
            .unwrap_or(grid.len());

        let mut values: Grid = (first_row..last_row.max(first_row))
            .map(|r| {
                let row = grid.get(r).cloned().unwrap_or_default();
                let mut cells: Vec<CellValue> = (first_col..last_col)
                    .map(|c| row.get(c).cloned().unwrap_or_default())
                    .collect();
                while cells.last().is_some_and(|c| !has_content(c)) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while values.last().is_some_and(Vec::is_empty) {
            values.pop();
        }

        let end_row = parsed.start.row() as usize + values.len().saturating_sub(1);
        let returned = format!(
            "{}!{}:{}{}",
            quote_sheet_name(&sheet),
            parsed.start,
            column_letters(parsed.last_col()),
            end_row
        );

        Ok(ValueRange {
            range: returned,
            major_dimension: Some("ROWS".to_string()),
            values,
        })
    }

    async fn append_values(
        &self,
        range: &str,
        rows: Vec<Vec<CellValue>>,
        _option: ValueInputOption,
    ) -> Result<AppendValuesResponse, SheetStoreError> {
        let (sheet, parsed) = self.resolve(range)?;
        let mut grid = self
            .sheets
            .get_mut(&sheet)
            .ok_or_else(|| SheetStoreError::InvalidRange(range.to_string()))?;

        let start = parsed.start;
        let table_end = last_occupied_row(&grid, start.row());
        let first_new_row = table_end.map(|r| r + 1).unwrap_or(start.row());
        let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;

        let mut cells = 0;
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                write_cell(
                    &mut grid,
                    (first_new_row - 1) as usize + r,
                    (start.col() - 1) as usize + c,
                    value.clone(),
                );
                cells += 1;
            }
        }

        let last_new_row = first_new_row + (rows.len() as u32).saturating_sub(1);
        let last_col = start.col() + width.saturating_sub(1);
        let updated_range = format!(
            "{}!{}{}:{}{}",
            quote_sheet_name(&sheet),
            column_letters(start.col()),
            first_new_row,
            column_letters(last_col),
            last_new_row
        );
        let table_range = table_end.map(|end| {
            format!(
                "{}!{}:{}{}",
                quote_sheet_name(&sheet),
                start,
                column_letters(last_col),
                end
            )
        });

        Ok(AppendValuesResponse {
            table_range,
            updates: UpdateValuesResponse {
                updated_range: updated_range.clone(),
                updated_rows: rows.len() as u64,
                updated_cells: cells,
                updated_data: Some(ValueRange {
                    range: updated_range,
                    major_dimension: Some("ROWS".to_string()),
                    values: rows,
                }),
            },
        })
    }

    async fn batch_update(
        &self,
        request: &BatchUpdateRequest,
    ) -> Result<BatchUpdateResponse, SheetStoreError> {
        self.batch_updates.fetch_add(1, Ordering::SeqCst);

        // Resolve everything first so a bad range writes nothing.
        let targets = request
            .data
            .iter()
            .map(|vr| self.resolve(&vr.range).map(|target| (target, &vr.values)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = HashSet::new();
        let mut columns = HashSet::new();
        let mut cells = 0;

        for ((sheet, parsed), values) in targets {
            let mut grid = self
                .sheets
                .get_mut(&sheet)
                .ok_or_else(|| SheetStoreError::InvalidRange(sheet.clone()))?;
            for (r, row) in values.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    if matches!(value, CellValue::Empty) {
                        continue;
                    }
                    let row_idx = parsed.start.row() as usize - 1 + r;
                    let col_idx = parsed.start.col() as usize - 1 + c;
                    write_cell(&mut grid, row_idx, col_idx, value.clone());
                    rows.insert((sheet.clone(), row_idx));
                    columns.insert((sheet.clone(), col_idx));
                    cells += 1;
                }
            }
        }

        Ok(BatchUpdateResponse {
            spreadsheet_id: self.spreadsheet_id.clone(),
            total_updated_rows: rows.len() as u64,
            total_updated_columns: columns.len() as u64,
            total_updated_cells: cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    fn seeded() -> InMemorySpreadsheet {
        let store = InMemorySpreadsheet::new("sheet-id");
        store.put_rows(
            "Sheet1",
            CellAddress::parse("A5").unwrap(),
            vec![
                text(&["図番", "納期", "金額(税抜)"]),
                text(&["MA-0001", "", ""]),
                text(&["MA-0002", "1/5"]),
            ],
        );
        store
    }

    #[tokio::test]
    async fn get_values_trims_trailing_blanks() {
        let store = seeded();
        let values = store.get_values("'Sheet1'!A5:Q").await.unwrap();

        assert_eq!(values.range, "'Sheet1'!A5:Q7");
        assert_eq!(values.values.len(), 3);
        assert_eq!(values.values[1], text(&["MA-0001"]));
        assert_eq!(values.values[2], text(&["MA-0002", "1/5"]));
    }

    #[tokio::test]
    async fn get_values_respects_the_column_window() {
        let store = seeded();
        let values = store.get_values("Sheet1!B6:B7").await.unwrap();
        assert_eq!(values.values, vec![Vec::new(), text(&["1/5"])]);
    }

    #[tokio::test]
    async fn unknown_sheets_and_unqualified_ranges_are_errors() {
        let store = seeded();
        assert!(matches!(
            store.get_values("Other!A1:B").await,
            Err(SheetStoreError::Api { status: 400, .. })
        ));
        assert!(matches!(
            store.get_values("A1:B").await,
            Err(SheetStoreError::InvalidRange(_))
        ));
    }

    #[tokio::test]
    async fn append_lands_below_the_last_row() {
        let store = seeded();
        let response = store
            .append_values(
                "'Sheet1'!A5",
                vec![text(&["MA-0003", "2/1"])],
                ValueInputOption::UserEntered,
            )
            .await
            .unwrap();

        assert_eq!(response.updates.updated_range, "'Sheet1'!A8:B8");
        assert_eq!(response.table_range.as_deref(), Some("'Sheet1'!A5:B7"));
        assert_eq!(store.cell("Sheet1", "A8"), CellValue::from("MA-0003"));
    }

    #[tokio::test]
    async fn batch_update_writes_all_or_nothing() {
        let store = seeded();
        let request = BatchUpdateRequest {
            data: vec![
                ValueRange::single("'Sheet1'!B6", CellValue::from("12/31")),
                ValueRange::single("Missing!B6", CellValue::from("x")),
            ],
            value_input_option: ValueInputOption::UserEntered,
        };

        assert!(store.batch_update(&request).await.is_err());
        assert_eq!(store.cell("Sheet1", "B6"), CellValue::from(""));

        let request = BatchUpdateRequest {
            data: vec![ValueRange::single("'Sheet1'!B6", CellValue::from("12/31"))],
            value_input_option: ValueInputOption::UserEntered,
        };
        let response = store.batch_update(&request).await.unwrap();
        assert_eq!(response.total_updated_cells, 1);
        assert_eq!(store.cell("Sheet1", "B6"), CellValue::from("12/31"));
        assert_eq!(store.batch_update_calls(), 2);
    }
}
