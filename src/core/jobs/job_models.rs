use crate::core::schedule::CellValue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One job as gathered from calculation sheets, part lists and contact forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRecord {
    pub job_number: String,
    pub due_date: Option<String>,
    pub price: Option<CellValue>,
    pub gas_qty: Option<CellValue>,
    pub hose_qty: Option<CellValue>,
    pub hose_type: Option<String>,
    pub hose_attachment_types: Vec<String>,
    pub customer_name: Option<String>,
    pub end_user: Option<String>,
}

/// Which part of a [`JobRecord`] feeds a schedule column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobField {
    DueDate,
    Price,
    GasQty,
    HoseQty,
    HoseType,
    HoseAttachmentTypes,
    CustomerName,
    EndUser,
}

impl JobField {
    pub fn value(&self, record: &JobRecord) -> CellValue {
        match self {
            // Calculation sheets write dates as 12.31
            JobField::DueDate => record
                .due_date
                .as_deref()
                .map(|d| d.replace('.', "/"))
                .into(),
            JobField::Price => record.price.clone().unwrap_or_default(),
            JobField::GasQty => record.gas_qty.clone().unwrap_or_default(),
            JobField::HoseQty => record.hose_qty.clone().unwrap_or_default(),
            JobField::HoseType => record.hose_type.clone().into(),
            JobField::HoseAttachmentTypes => {
                let mut types: Vec<&str> = record
                    .hose_attachment_types
                    .iter()
                    .map(|t| t.trim())
                    .filter(|t| !t.is_empty())
                    .collect();
                types.sort_unstable();
                types.dedup();
                CellValue::from(types.join("/"))
            }
            JobField::CustomerName => record.customer_name.clone().into(),
            JobField::EndUser => record.end_user.clone().into(),
        }
    }
}

/// Ordered schedule column name → job field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleColumnMap {
    columns: Vec<(String, JobField)>,
}

impl ScheduleColumnMap {
    pub fn new(columns: Vec<(String, JobField)>) -> Self {
        Self { columns }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, JobField)> {
        self.columns.iter().map(|(name, field)| (name.as_str(), *field))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

impl Default for ScheduleColumnMap {
    /// Headers of the shared schedule sheet.
    fn default() -> Self {
        Self::new(
            [
                ("納期", JobField::DueDate),
                ("金額(税抜)", JobField::Price),
                ("ガス本数", JobField::GasQty),
                ("ホース本数", JobField::HoseQty),
                ("ホースタイプ", JobField::HoseType),
                ("利用したホースの接続継手の種類", JobField::HoseAttachmentTypes),
                ("顧客名", JobField::CustomerName),
                ("エンドユーザー", JobField::EndUser),
            ]
            .into_iter()
            .map(|(name, field)| (name.to_string(), field))
            .collect(),
        )
    }
}

#[derive(Debug, Error)]
pub enum JobSourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Somewhere job records come from.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn load_jobs(&self) -> Result<Vec<JobRecord>, JobSourceError>;
}
