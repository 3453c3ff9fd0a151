use crate::core::jobs::{JobRecord, JobSource, JobSourceError};
use async_trait::async_trait;
use std::path::PathBuf;

/// Job records exported as a JSON array, one object per job.
pub struct JsonJobSource {
    path: PathBuf,
}

impl JsonJobSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl JobSource for JsonJobSource {
    async fn load_jobs(&self) -> Result<Vec<JobRecord>, JobSourceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let records: Vec<JobRecord> = serde_json::from_str(&content)?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "Loaded job records");
        Ok(records)
    }
}
