//! HTTP client for the Google Sheets v4 `values` API.
//!
//! Wraps `reqwest` with bearer-token auth, A1 range construction, and typed
//! errors. Only the four calls the reconciliation service needs are exposed:
//! `values.get`, `values.update`, `values.append` and `values.clear`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_core::SheetsConfig;

use crate::auth::{TokenSource, DEFAULT_TOKEN_URL};
use crate::error::SheetsError;
use crate::range::{clear_range, id_cell, row_range, rows_range, table_range};
use crate::table::SheetTable;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Vec<String>],
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for one spreadsheet's `Products` sheet.
///
/// Use [`GoogleSheetsClient::new`] for production or
/// [`GoogleSheetsClient::with_base_url`] to point at a mock server in tests.
pub struct GoogleSheetsClient {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    tokens: TokenSource,
}

impl GoogleSheetsClient {
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SheetsError::Auth`] if the service-account key is unusable.
    pub fn new(config: &SheetsConfig) -> Result<Self, SheetsError> {
        Self::with_base_url(config, DEFAULT_BASE_URL, DEFAULT_TOKEN_URL)
    }

    /// Creates a client against custom API and token endpoints (for wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`GoogleSheetsClient::new`], plus [`SheetsError::Auth`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        config: &SheetsConfig,
        base_url: &str,
        token_url: &str,
    ) -> Result<Self, SheetsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("storefront/0.1 (sheet-sync)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| SheetsError::Auth(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            spreadsheet_id: config.spreadsheet_id.clone(),
            tokens: TokenSource::from_credentials(&config.credentials, token_url)?,
        })
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}{suffix}`.
    pub(crate) fn values_url(&self, range: &str, suffix: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("v4")
                .push("spreadsheets")
                .push(&self.spreadsheet_id)
                .push("values")
                .push(&format!("{range}{suffix}"));
        }
        url
    }

    async fn bearer(&self) -> Result<String, SheetsError> {
        self.tokens.access_token(&self.client).await
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let response = self
            .client
            .get(self.values_url(range, ""))
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;
        let body = Self::check_status(response).await?;

        let parsed: ValueRange = serde_json::from_str(&body).map_err(|e| SheetsError::Deserialize {
            context: format!("values.get({range})"),
            source: e,
        })?;

        Ok(parsed
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn update_values(&self, range: &str, values: &[Vec<String>]) -> Result<(), SheetsError> {
        let response = self
            .client
            .put(self.values_url(range, ""))
            .bearer_auth(self.bearer().await?)
            .query(&[("valueInputOption", "RAW")])
            .json(&ValueRangeBody {
                range,
                major_dimension: "ROWS",
                values,
            })
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn append_values(&self, range: &str, values: &[Vec<String>]) -> Result<(), SheetsError> {
        let response = self
            .client
            .post(self.values_url(range, ":append"))
            .bearer_auth(self.bearer().await?)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&ValueRangeBody {
                range,
                major_dimension: "ROWS",
                values,
            })
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn clear_values(&self, range: &str) -> Result<(), SheetsError> {
        let response = self
            .client
            .post(self.values_url(range, ":clear"))
            .bearer_auth(self.bearer().await?)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Returns the body on 2xx, otherwise [`SheetsError::Api`] carrying the
    /// API's error message when one can be parsed.
    async fn check_status(response: Response) -> Result<String, SheetsError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(SheetsError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetTable for GoogleSheetsClient {
    async fn read_rows(&self, first: u32, last: u32) -> Result<Vec<Vec<String>>, SheetsError> {
        self.get_values(&rows_range(first, last)).await
    }

    async fn write_row(&self, row: u32, cells: Vec<String>) -> Result<(), SheetsError> {
        self.update_values(&row_range(row), &[cells]).await
    }

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<(), SheetsError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.append_values(&table_range(), &rows).await
    }

    async fn clear(&self) -> Result<(), SheetsError> {
        self.clear_values(&clear_range()).await
    }

    async fn read_id(&self, row: u32) -> Result<Option<String>, SheetsError> {
        let rows = self.get_values(&id_cell(row)).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|cells| cells.into_iter().next())
            .filter(|cell| !cell.trim().is_empty()))
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
