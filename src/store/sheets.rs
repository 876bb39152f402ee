//! Google Sheets implementation of [`SheetBackend`].
//!
//! Uses the Sheets v4 REST API directly:
//!
//! - `GET  /v4/spreadsheets/{id}/values/{range}`
//! - `POST /v4/spreadsheets/{id}/values/{range}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS`
//!
//! Reads are retried under a fixed attempt cap. Appends are sent exactly
//! once; a retried append could write the same rows twice.

use super::SheetBackend;
use crate::error::Result;
use crate::http::{FixedAttempts, expect_success};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct AppendBody<'a> {
    values: &'a [Vec<String>],
}

#[derive(Debug)]
pub struct GoogleSheets {
    http: Client,
    spreadsheet_id: String,
    access_token: String,
    attempts: FixedAttempts,
}

impl GoogleSheets {
    pub fn new(
        http: Client,
        spreadsheet_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            spreadsheet_id: spreadsheet_id.into(),
            access_token: access_token.into(),
            attempts: FixedAttempts::default(),
        }
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            SHEETS_API,
            self.spreadsheet_id,
            urlencoding::encode(range)
        )
    }
}

impl SheetBackend for GoogleSheets {
    #[instrument(level = "info", skip(self))]
    async fn get_rows(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(range);
        let url = url.as_str();
        let body: ValueRange = self
            .attempts
            .run("sheets_get", move || async move {
                let resp = self
                    .http
                    .get(url)
                    .bearer_auth(&self.access_token)
                    .send()
                    .await?;
                Ok(expect_success(resp).await?.json().await?)
            })
            .await?;
        debug!(rows = body.values.len(), "Fetched sheet values");
        Ok(body.values)
    }

    #[instrument(level = "info", skip(self, rows), fields(rows = rows.len()))]
    async fn append_rows(&self, range: &str, rows: Vec<Vec<String>>) -> Result<()> {
        let url = format!("{}:append", self.values_url(range));
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&AppendBody { values: &rows })
            .send()
            .await?;
        expect_success(resp).await?;
        Ok(())
    }
}
