// =============================================================================
// GOOGLE SHEETS MODULE
// =============================================================================
//
// REST adapter for the `SpreadsheetStore` port. Lives in infra because it does
// the HTTP; core only sees value ranges.
//
// **Authentication:** a service account shared on the schedule spreadsheet
// (see `service_account.rs`). `StaticToken` covers tests and one-off runs
// with a token obtained elsewhere.

pub mod google_sheets_client;
pub mod service_account;

pub use google_sheets_client::GoogleSheetsClient;
pub use service_account::{AccessTokenProvider, ServiceAccountAuth, StaticToken};
