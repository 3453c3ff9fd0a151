use super::reconcile::UpdateRecord;
use super::search_range::{SearchRange, SearchRangeError};
use super::sparse_table::CellValue;
use chrono::{Datelike, Months, NaiveDate};

pub const DEFAULT_RIGHT_COLUMN: &str = "Q";
pub const DEFAULT_PAYMENT_DAY: u32 = 25;
/// Header of the job number column on the schedule sheet.
pub const DEFAULT_KEY_COLUMN: &str = "図番";

/// Where the schedule table lives and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub spreadsheet_id: String,
    pub search_range: SearchRange,
    /// Rightmost column read into the snapshot.
    pub right_column: String,
    /// Header whose values key each row. `None` keys on the first column.
    pub key_column: Option<String>,
    /// Day of month payments fall due.
    pub payment_day: u32,
}

impl ScheduleConfig {
    pub fn new(spreadsheet_id: impl Into<String>, search_range: SearchRange) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            search_range,
            right_column: DEFAULT_RIGHT_COLUMN.to_string(),
            key_column: Some(DEFAULT_KEY_COLUMN.to_string()),
            payment_day: DEFAULT_PAYMENT_DAY,
        }
    }

    /// Reads `SCHEDULE_*` variables. Call `dotenv` first if a `.env` file is used.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] with variables looked up through `var`.
    ///
    /// A blank `SCHEDULE_KEY_COLUMN` keys rows on the first column.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            var(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let spreadsheet_id = required("SCHEDULE_SPREADSHEET_ID")?;
        let search_range = SearchRange::parse(&required("SCHEDULE_TABLE_RANGE")?)?;
        let mut config = Self::new(spreadsheet_id, search_range);

        if let Some(column) = var("SCHEDULE_TABLE_RIGHT_COLUMN") {
            config.right_column = column;
        }
        if let Some(key) = var("SCHEDULE_KEY_COLUMN") {
            config.key_column = Some(key.trim().to_string()).filter(|k| !k.is_empty());
        }
        if let Some(day) = var("SCHEDULE_PAYMENT_DAY") {
            config.payment_day = day
                .trim()
                .parse()
                .ok()
                .filter(|d| (1..=31).contains(d))
                .ok_or(ConfigError::Invalid("SCHEDULE_PAYMENT_DAY", day))?;
        }

        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),

    #[error("Invalid SCHEDULE_TABLE_RANGE: {0}")]
    Range(#[from] SearchRangeError),
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub snapshot_rows: usize,
    pub candidate_rows: usize,
    pub updates: Vec<UpdateRecord>,
    /// Cells the backend reports as written. Zero when nothing was sent.
    pub updated_cells: u64,
}

/// A new job appended as the last row of the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub client: String,
    pub job_number: String,
    pub assignee: String,
    pub start_date: NaiveDate,
    pub payment_due: NaiveDate,
    pub customer: String,
}

impl ScheduleEntry {
    /// The row as written from the anchor column rightwards.
    ///
    /// The first cell numbers the row relative to the header at `anchor_row`.
    pub fn to_row(&self, anchor_row: u32) -> Vec<CellValue> {
        let blank = || CellValue::from("");
        vec![
            CellValue::from(format!("=ROW() - {anchor_row}")),
            CellValue::from(self.client.as_str()),
            CellValue::from(self.job_number.as_str()),
            CellValue::from(self.assignee.as_str()),
            blank(),
            CellValue::from(self.start_date.format("%Y/%m/%d").to_string()),
            blank(),
            blank(),
            blank(),
            CellValue::from(self.payment_due.format("%Y/%m/%d").to_string()),
            blank(),
            blank(),
            CellValue::from(self.customer.as_str()),
        ]
    }
}

/// Payment due date for work starting on `today`.
///
/// Due on `standard_day` of the month after `today` (two months after when
/// `next_month` is set), clamped to the end of that month.
pub fn payment_due_date(today: NaiveDate, standard_day: u32, next_month: bool) -> Option<NaiveDate> {
    let months = if next_month { 2 } else { 1 };
    let first = today.with_day(1)?.checked_add_months(Months::new(months))?;
    let last_day = first
        .checked_add_months(Months::new(1))?
        .pred_opt()?
        .day();
    first.with_day(standard_day.clamp(1, last_day))
}
