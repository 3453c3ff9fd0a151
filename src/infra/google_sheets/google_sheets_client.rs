use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use super::service_account::AccessTokenProvider;
use crate::core::schedule::{
    AppendValuesResponse, BatchUpdateRequest, BatchUpdateResponse, CellValue, SheetStoreError,
    SpreadsheetStore, ValueInputOption, ValueRange,
};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Sheets v4 REST client bound to one spreadsheet. Only the value endpoints are exposed.
pub struct GoogleSheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    auth: Box<dyn AccessTokenProvider>,
}

impl GoogleSheetsClient {
    pub fn new(auth: impl AccessTokenProvider + 'static, spreadsheet_id: impl Into<String>) -> Self {
        Self::with_base_url(auth, spreadsheet_id, SHEETS_API_BASE)
    }

    pub fn with_base_url(
        auth: impl AccessTokenProvider + 'static,
        spreadsheet_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            auth: Box::new(auth),
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// `{base}/v4/spreadsheets/{id}/{tail...}` with each segment percent-encoded.
    fn endpoint(&self, tail: &[&str]) -> Result<Url, SheetStoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetStoreError::Http(format!("Bad base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetStoreError::Http(format!("Bad base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str()])
            .extend(tail);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SheetStoreError> {
        let token = self.auth.access_token().await?;

        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SheetStoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SheetStoreError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SheetStoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SpreadsheetStore for GoogleSheetsClient {
    async fn get_values(&self, range: &str) -> Result<ValueRange, SheetStoreError> {
        let url = self.endpoint(&["values", range])?;
        tracing::debug!(spreadsheet = %self.spreadsheet_id, %range, "values.get");
        self.send(self.client.get(url)).await
    }

    async fn append_values(
        &self,
        range: &str,
        rows: Vec<Vec<CellValue>>,
        option: ValueInputOption,
    ) -> Result<AppendValuesResponse, SheetStoreError> {
        let url = self.endpoint(&["values", &format!("{range}:append")])?;
        tracing::debug!(spreadsheet = %self.spreadsheet_id, %range, rows = rows.len(), "values.append");

        let body = ValueRange {
            range: range.to_string(),
            major_dimension: None,
            values: rows,
        };
        let request = self
            .client
            .post(url)
            .query(&[
                ("valueInputOption", option.as_str()),
                ("insertDataOption", "INSERT_ROWS"),
                ("includeValuesInResponse", "true"),
            ])
            .json(&body);
        self.send(request).await
    }

    async fn batch_update(
        &self,
        request: &BatchUpdateRequest,
    ) -> Result<BatchUpdateResponse, SheetStoreError> {
        let url = self.endpoint(&["values:batchUpdate"])?;
        tracing::debug!(spreadsheet = %self.spreadsheet_id, ranges = request.data.len(), "values.batchUpdate");
        self.send(self.client.post(url).json(request)).await
    }
}
