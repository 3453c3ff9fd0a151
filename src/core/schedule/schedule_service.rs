use super::cell_address::AddressError;
use super::reconcile::{diff, UpdateRecord};
use super::schedule_models::{ReconcileReport, ScheduleConfig, ScheduleEntry};
use super::schedule_store::{
    AppendValuesResponse, BatchUpdateRequest, BatchUpdateResponse, SheetStoreError,
    SpreadsheetStore, ValueInputOption,
};
use super::search_range::SearchRangeError;
use super::sparse_table::{SparseTable, TableError};
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Store error: {0}")]
    Store(#[from] SheetStoreError),
    #[error("Address error: {0}")]
    Address(#[from] AddressError),
    #[error("Range error: {0}")]
    Range(#[from] SearchRangeError),
    #[error("Table error: {0}")]
    Table(#[from] TableError),
}

/// Keeps the shared schedule sheet in step with computed job data.
///
/// Every call reads the sheet afresh; nothing is cached between calls.
pub struct ScheduleService<S: SpreadsheetStore> {
    store: S,
    config: ScheduleConfig,
}

impl<S: SpreadsheetStore> ScheduleService<S> {
    pub fn new(store: S, config: ScheduleConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the whole table below and right of the anchor.
    pub async fn read_snapshot(&self) -> Result<SparseTable, ScheduleError> {
        let anchor = &self.config.search_range;
        let range = anchor.table_range(&self.config.right_column);

        let values = self.store.get_values(&range).await?;
        tracing::debug!(
            requested = %range,
            returned = %values.range,
            rows = values.values.len(),
            "Read schedule table"
        );

        let table = SparseTable::from_sheet_rows(
            anchor.first_column_index()?,
            values.values,
            self.config.key_column.as_deref(),
        )?;
        Ok(table)
    }

    /// Cells of `old` to fill from `new`.
    pub fn plan(
        &self,
        old: &SparseTable,
        new: &SparseTable,
    ) -> Result<Vec<UpdateRecord>, ScheduleError> {
        Ok(diff(&self.config.search_range, old, new)?)
    }

    /// Sends every batch in a single write. Returns `None` when there was nothing to send.
    pub async fn apply<B>(&self, batches: B) -> Result<Option<BatchUpdateResponse>, ScheduleError>
    where
        B: IntoIterator,
        B::Item: IntoIterator<Item = UpdateRecord>,
    {
        let request = BatchUpdateRequest::from_batches(&self.config.search_range, batches);
        if request.is_empty() {
            tracing::info!("Schedule is up to date, nothing to write");
            return Ok(None);
        }

        tracing::debug!(ranges = request.data.len(), "Sending schedule batch update");
        let response = self.store.batch_update(&request).await?;
        Ok(Some(response))
    }

    /// Reads the sheet, diffs it against `candidate` and writes the difference.
    pub async fn reconcile(&self, candidate: &SparseTable) -> Result<ReconcileReport, ScheduleError> {
        self.reconcile_all(std::slice::from_ref(candidate)).await
    }

    /// Like [`Self::reconcile`] for several candidate tables, sharing one read and one write.
    pub async fn reconcile_all(
        &self,
        candidates: &[SparseTable],
    ) -> Result<ReconcileReport, ScheduleError> {
        let snapshot = self.read_snapshot().await?;

        let mut batches = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            batches.push(self.plan(&snapshot, candidate)?);
        }

        // Same first-write-wins rule the batch request applies.
        let mut seen = HashSet::new();
        let updates: Vec<UpdateRecord> = batches
            .into_iter()
            .flatten()
            .filter(|record| seen.insert(record.address))
            .collect();

        let response = self.apply([updates.clone()]).await?;
        let updated_cells = response.map(|r| r.total_updated_cells).unwrap_or(0);

        tracing::info!(
            snapshot_rows = snapshot.len(),
            candidates = candidates.len(),
            updates = updates.len(),
            updated_cells,
            "Schedule reconciled"
        );

        Ok(ReconcileReport {
            snapshot_rows: snapshot.len(),
            candidate_rows: candidates.iter().map(SparseTable::len).sum(),
            updates,
            updated_cells,
        })
    }

    /// Appends `entry` as a new row at the bottom of the schedule.
    pub async fn append_entry(
        &self,
        entry: &ScheduleEntry,
    ) -> Result<AppendValuesResponse, ScheduleError> {
        let anchor = &self.config.search_range;
        let row = entry.to_row(anchor.first_row);

        let response = self
            .store
            .append_values(&anchor.to_string(), vec![row], ValueInputOption::UserEntered)
            .await?;

        tracing::info!(
            job_number = %entry.job_number,
            range = %response.updates.updated_range,
            "Appended schedule entry"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::jobs::{build_candidate_table, JobRecord, ScheduleColumnMap};
    use crate::core::schedule::{CellAddress, CellValue, SearchRange};
    use crate::infra::schedule::InMemorySpreadsheet;
    use chrono::NaiveDate;

    fn text(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    /// Schedule anchored at B5 with two jobs, one of them partly filled in.
    fn service() -> ScheduleService<InMemorySpreadsheet> {
        let store = InMemorySpreadsheet::new("sheet-id");
        store.put_rows(
            "Sheet1",
            CellAddress::parse("B5").unwrap(),
            vec![
                text(&["図番", "納期", "金額(税抜)"]),
                text(&["MA-0001", "", ""]),
                text(&["MA-0002", "1/5"]),
            ],
        );
        let config = ScheduleConfig::new("sheet-id", SearchRange::parse("Sheet1!B5").unwrap());
        ScheduleService::new(store, config)
    }

    fn candidate(rows: &[(&str, &str, f64)]) -> SparseTable {
        let mut table = SparseTable::new(1, ["納期", "金額(税抜)"]);
        for (key, due, price) in rows {
            table.set(key, "納期", CellValue::from(*due));
            table.set(key, "金額(税抜)", CellValue::from(*price));
        }
        table
    }

    #[tokio::test]
    async fn snapshot_keeps_physical_columns() {
        let service = service();
        let snapshot = service.read_snapshot().await.unwrap();

        let columns: Vec<_> = snapshot.columns().collect();
        assert_eq!(columns, vec![("図番", 2), ("納期", 3), ("金額(税抜)", 4)]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("MA-0002", "納期"), Some(&CellValue::from("1/5")));
    }

    #[tokio::test]
    async fn reconcile_fills_only_empty_cells() {
        let service = service();
        let report = service
            .reconcile(&candidate(&[
                ("MA-0001", "12/31", 100.0),
                ("MA-0002", "2/2", 200.0),
                ("MA-0003", "3/3", 300.0),
            ]))
            .await
            .unwrap();

        let cells: Vec<String> = report.updates.iter().map(|u| u.address.to_string()).collect();
        assert_eq!(cells, vec!["C6", "D6", "D7"]);
        assert_eq!(report.updated_cells, 3);
        assert_eq!(report.snapshot_rows, 2);
        assert_eq!(report.candidate_rows, 3);

        let store = service.store();
        assert_eq!(store.cell("Sheet1", "C6"), CellValue::from("12/31"));
        assert_eq!(store.cell("Sheet1", "D6"), CellValue::from(100.0));
        assert_eq!(store.cell("Sheet1", "C7"), CellValue::from("1/5"));
        assert_eq!(store.cell("Sheet1", "D7"), CellValue::from(200.0));
        assert_eq!(store.cell("Sheet1", "B8"), CellValue::Empty);
    }

    #[tokio::test]
    async fn second_pass_writes_nothing() {
        let service = service();
        let table = candidate(&[("MA-0001", "12/31", 100.0)]);

        service.reconcile(&table).await.unwrap();
        let report = service.reconcile(&table).await.unwrap();

        assert!(report.updates.is_empty());
        assert_eq!(report.updated_cells, 0);
        assert_eq!(service.store().batch_update_calls(), 1);
    }

    #[tokio::test]
    async fn empty_candidate_values_are_not_written() {
        let service = service();
        let report = service
            .reconcile(&candidate(&[("MA-0001", "", 0.0)]))
            .await
            .unwrap();

        assert!(report.updates.is_empty());
        assert_eq!(service.store().batch_update_calls(), 0);
    }

    #[tokio::test]
    async fn reconcile_all_shares_one_write_and_first_value_wins() {
        let service = service();
        let report = service
            .reconcile_all(&[
                candidate(&[("MA-0001", "12/31", 100.0)]),
                candidate(&[("MA-0001", "11/30", 0.0), ("MA-0002", "", 200.0)]),
            ])
            .await
            .unwrap();

        assert_eq!(report.updates.len(), 3);
        assert_eq!(service.store().batch_update_calls(), 1);
        assert_eq!(service.store().cell("Sheet1", "C6"), CellValue::from("12/31"));
        assert_eq!(service.store().cell("Sheet1", "D7"), CellValue::from(200.0));
    }

    #[tokio::test]
    async fn key_column_can_be_chosen_by_header() {
        let store = InMemorySpreadsheet::new("sheet-id");
        store.put_rows(
            "予定",
            CellAddress::parse("A5").unwrap(),
            vec![
                text(&["No", "図番", "納期"]),
                vec![CellValue::from(1i64), CellValue::from("MA-0001")],
            ],
        );
        let mut config = ScheduleConfig::new("sheet-id", SearchRange::parse("予定!A5").unwrap());
        config.key_column = Some("図番".to_string());
        let service = ScheduleService::new(store, config);

        let mut table = SparseTable::new(1, ["納期"]);
        table.set("MA-0001", "納期", CellValue::from("4/1"));
        let report = service.reconcile(&table).await.unwrap();

        assert_eq!(report.updates.len(), 1);
        assert_eq!(service.store().cell("予定", "C6"), CellValue::from("4/1"));
    }

    #[tokio::test]
    async fn unknown_key_column_is_a_table_error() {
        let mut service = service();
        service.config.key_column = Some("品番".to_string());
        let err = service.read_snapshot().await.unwrap_err();
        assert!(matches!(err, ScheduleError::Table(TableError::UnknownKeyColumn(_))));
    }

    #[tokio::test]
    async fn missing_sheet_surfaces_the_store_error() {
        let store = InMemorySpreadsheet::new("sheet-id");
        let config = ScheduleConfig::new("sheet-id", SearchRange::parse("Sheet1!B5").unwrap());
        let service = ScheduleService::new(store, config);

        let err = service.reconcile(&candidate(&[])).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Store(_)));
    }

    #[tokio::test]
    async fn appended_jobs_are_matched_by_job_number() {
        let store = InMemorySpreadsheet::new("sheet-id");
        store.put_rows(
            "Sheet1",
            CellAddress::parse("A5").unwrap(),
            vec![text(&[
                "No",
                "依頼元",
                "図番",
                "担当",
                "納期",
                "着手日",
                "金額(税抜)",
                "ガス本数",
                "ホース本数",
                "支払日",
                "ホースタイプ",
                "備考",
                "顧客名",
            ])],
        );
        let config = ScheduleConfig::new("sheet-id", SearchRange::parse("Sheet1!A5").unwrap());
        let service = ScheduleService::new(store, config);

        let date = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
        service
            .append_entry(&ScheduleEntry {
                client: "ミスミ".to_string(),
                job_number: "MA-0001".to_string(),
                assignee: String::new(),
                start_date: date(5, 1),
                payment_due: date(6, 25),
                customer: "ACME".to_string(),
            })
            .await
            .unwrap();

        let candidate = build_candidate_table(
            &[JobRecord {
                job_number: "MA-0001".to_string(),
                due_date: Some("12.31".to_string()),
                price: Some(CellValue::from(54000.0)),
                customer_name: Some("Other".to_string()),
                ..Default::default()
            }],
            &ScheduleColumnMap::default(),
        );
        let report = service.reconcile(&candidate).await.unwrap();

        let cells: Vec<String> = report.updates.iter().map(|u| u.address.to_string()).collect();
        assert_eq!(cells, vec!["E6", "G6"]);
        assert_eq!(service.store().cell("Sheet1", "E6"), CellValue::from("12/31"));
        assert_eq!(service.store().cell("Sheet1", "M6"), CellValue::from("ACME"));
    }

    #[tokio::test]
    async fn append_entry_adds_a_row_below_the_table() {
        let service = service();
        let date = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
        let entry = ScheduleEntry {
            client: "ミスミ".to_string(),
            job_number: "MA-0003".to_string(),
            assignee: "友希".to_string(),
            start_date: date(5, 1),
            payment_due: date(6, 25),
            customer: "ACME".to_string(),
        };

        let response = service.append_entry(&entry).await.unwrap();

        assert_eq!(response.updates.updated_range, "'Sheet1'!B8:N8");
        assert_eq!(service.store().cell("Sheet1", "B8"), CellValue::from("=ROW() - 5"));
        assert_eq!(service.store().cell("Sheet1", "D8"), CellValue::from("MA-0003"));
        assert_eq!(service.store().cell("Sheet1", "N8"), CellValue::from("ACME"));
    }
}
