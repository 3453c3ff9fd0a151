use super::job_models::{JobRecord, ScheduleColumnMap};
use super::job_number::JobNumber;
use crate::core::schedule::SparseTable;

/// Lays job records out as schedule rows, keyed by job number.
///
/// Records without a recognizable job number are skipped, since the schedule
/// cannot be matched without one. When a job number repeats, the first record wins.
pub fn build_candidate_table(records: &[JobRecord], columns: &ScheduleColumnMap) -> SparseTable {
    let mut table = SparseTable::new(1, columns.names());

    for record in records {
        let Some(job_number) = JobNumber::parse(&record.job_number) else {
            tracing::warn!(
                job_number = %record.job_number,
                "Skipping job without a job number; register a part list or calculation sheet"
            );
            continue;
        };

        let key = job_number.as_str();
        if table.contains_row(key) {
            tracing::warn!(job_number = %key, "Duplicate job record ignored");
            continue;
        }

        table.push_row(key, Vec::new());
        for (column, field) in columns.iter() {
            table.set(key, column, field.value(record));
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::jobs::JobField;
    use crate::core::schedule::CellValue;

    fn record(job_number: &str, due: &str, price: f64) -> JobRecord {
        JobRecord {
            job_number: job_number.to_string(),
            due_date: Some(due.to_string()),
            price: Some(CellValue::from(price)),
            ..Default::default()
        }
    }

    #[test]
    fn builds_one_row_per_job() {
        let table = build_candidate_table(
            &[record("MA-0001", "12.31", 54000.0), record("MA-0002 _RH", "1/15", 0.0)],
            &ScheduleColumnMap::default(),
        );

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("MA-0001", "納期"), Some(&CellValue::from("12/31")));
        assert_eq!(table.get("MA-0001", "金額(税抜)"), Some(&CellValue::from(54000.0)));
        assert_eq!(table.get("MA-0002-RH", "納期"), Some(&CellValue::from("1/15")));
        assert_eq!(table.get("MA-0001", "顧客名"), Some(&CellValue::Empty));
    }

    #[test]
    fn skips_records_without_job_numbers_and_duplicates() {
        let table = build_candidate_table(
            &[
                record("", "1/1", 1.0),
                record("見積", "1/1", 1.0),
                record("MA-0001", "2/2", 2.0),
                record("MA-0001", "3/3", 3.0),
            ],
            &ScheduleColumnMap::default(),
        );

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("MA-0001", "納期"), Some(&CellValue::from("2/2")));
    }

    #[test]
    fn honours_a_custom_column_map() {
        let map = ScheduleColumnMap::new(vec![("Customer".to_string(), JobField::CustomerName)]);
        let table = build_candidate_table(
            &[JobRecord {
                job_number: "MA-0009".to_string(),
                customer_name: Some("ACME".to_string()),
                ..Default::default()
            }],
            &map,
        );

        let columns: Vec<_> = table.columns().map(|(name, _)| name).collect();
        assert_eq!(columns, vec!["Customer"]);
        assert_eq!(table.get("MA-0009", "Customer"), Some(&CellValue::from("ACME")));
    }
}
