// Schedule sheet reconciliation: read the table, diff it against computed
// values, write back only the cells that are still empty.

pub mod a1_range;
pub mod cell_address;
pub mod reconcile;
pub mod schedule_models;
pub mod schedule_service;
pub mod schedule_store;
pub mod search_range;
pub mod sparse_table;

pub use a1_range::A1Range;
pub use cell_address::{decode, encode, AddressError, CellAddress};
pub use reconcile::{diff, UpdateRecord};
pub use schedule_models::{
    payment_due_date, ConfigError, ReconcileReport, ScheduleConfig, ScheduleEntry,
};
pub use schedule_service::{ScheduleError, ScheduleService};
pub use schedule_store::{
    AppendValuesResponse, BatchUpdateRequest, BatchUpdateResponse, SheetStoreError,
    SpreadsheetStore, UpdateValuesResponse, ValueInputOption, ValueRange,
};
pub use search_range::{SearchRange, SearchRangeError};
pub use sparse_table::{CellValue, SparseTable, TableError, TableRow};
