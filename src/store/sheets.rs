// src/store/sheets.rs
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::config::ScraperTuning;
use crate::error::PipelineError;
use crate::ingest::types::{CandidateRecord, LogEntry, RecordStore, SourceDescriptor};
use crate::store::{
    format_timestamp, generate_id, item_row, log_row, now_in, source_from_row, ITEM_ID_PREFIX,
    ITEM_URL_COLUMN, LOG_ID_PREFIX, SOURCE_TIMESTAMP_COLUMN,
};

pub const DEFAULT_SHEETS_API: &str = "https://sheets.googleapis.com";
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Supplies a bearer token for each API call; implementations cache and refresh.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

#[async_trait]
impl AccessTokenSource for CustomServiceAccount {
    async fn access_token(&self) -> Result<String> {
        let token = self
            .token(&[SHEETS_SCOPE])
            .await
            .context("fetching sheets access token")?;
        Ok(token.as_str().to_string())
    }
}

/// Service-account key JSON out of `GOOGLE_CREDENTIALS`: base64 of the key
/// file, or the raw JSON itself. Whitespace inside the base64 is ignored.
pub fn decode_credentials(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let json = if raw.starts_with('{') {
        raw.to_string()
    } else {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(compact.as_bytes())
            .context("credentials are neither JSON nor base64")?;
        String::from_utf8(bytes).context("decoded credentials are not utf-8")?
    };

    let key: serde_json::Value =
        serde_json::from_str(&json).context("credentials are not valid JSON")?;
    for field in ["client_email", "private_key"] {
        if key.get(field).and_then(|v| v.as_str()).is_none() {
            return Err(anyhow!("service account key has no {field}"));
        }
    }
    Ok(json)
}

/// Token source for the spreadsheets scope built from `GOOGLE_CREDENTIALS`.
pub fn service_account(raw: &str) -> Result<Arc<dyn AccessTokenSource>, PipelineError> {
    let json = decode_credentials(raw)
        .map_err(|e| PipelineError::Config(format!("GOOGLE_CREDENTIALS: {e:#}")))?;
    let account = CustomServiceAccount::from_json(&json)
        .map_err(|e| PipelineError::Config(format!("GOOGLE_CREDENTIALS: {e}")))?;
    Ok(Arc::new(account))
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct ValueBody<'a> {
    values: &'a [Vec<String>],
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    updated_rows: Option<usize>,
}

fn cell_to_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn rows_of(range: ValueRange) -> Vec<Vec<String>> {
    range
        .values
        .iter()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect()
}

/// Google Sheets v4 values API client authenticated as a service account.
#[derive(Clone)]
pub struct SheetsStore {
    client: Client,
    api_base: String,
    spreadsheet_id: String,
    auth: Arc<dyn AccessTokenSource>,
    sources_tab: String,
    items_tab: String,
    logs_tab: String,
    utc_offset: FixedOffset,
}

impl SheetsStore {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        auth: Arc<dyn AccessTokenSource>,
        tuning: &ScraperTuning,
    ) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_millis(tuning.timeout_ms))
            .build()
            .map_err(|e| PipelineError::Config(format!("building sheets http client: {e}")))?;
        Ok(Self {
            client,
            api_base: DEFAULT_SHEETS_API.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            auth,
            sources_tab: tuning.sources_tab.clone(),
            items_tab: tuning.items_tab.clone(),
            logs_tab: tuning.logs_tab.clone(),
            utc_offset: tuning.utc_offset(),
        })
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// `{api}/v4/spreadsheets/{id}/values/{range}{suffix}`, range percent-encoded.
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_base).context("parsing sheets api base")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("sheets api base cannot be a base url"))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{range}{suffix}"));
        Ok(url)
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(range, "")?;
        let token = self.auth.access_token().await?;
        let body: ValueRange = self
            .client
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .with_context(|| format!("GET {range}"))?
            .error_for_status()
            .with_context(|| format!("GET {range}"))?
            .json()
            .await
            .with_context(|| format!("decoding {range}"))?;
        Ok(rows_of(body))
    }

    async fn append_rows(&self, range: &str, rows: &[Vec<String>]) -> Result<Option<usize>> {
        let mut url = self.values_url(range, ":append")?;
        let token = self.auth.access_token().await?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let resp: AppendResponse = self
            .client
            .post(url)
            .bearer_auth(&token)
            .json(&ValueBody { values: rows })
            .send()
            .await
            .with_context(|| format!("append {range}"))?
            .error_for_status()
            .with_context(|| format!("append {range}"))?
            .json()
            .await
            .with_context(|| format!("decoding append response for {range}"))?;
        Ok(resp.updates.and_then(|u| u.updated_rows))
    }

    async fn update_cell(&self, range: &str, value: String) -> Result<()> {
        let mut url = self.values_url(range, "")?;
        let token = self.auth.access_token().await?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        self.client
            .put(url)
            .bearer_auth(&token)
            .json(&ValueBody {
                values: &[vec![value]],
            })
            .send()
            .await
            .with_context(|| format!("update {range}"))?
            .error_for_status()
            .with_context(|| format!("update {range}"))?;
        Ok(())
    }
}

/// Skips the header row, keeps active rows only.
pub fn active_sources_from_rows(rows: &[Vec<String>]) -> Vec<SourceDescriptor> {
    rows.iter()
        .skip(1)
        .map(|r| source_from_row(r))
        .filter(|s| s.is_active)
        .collect()
}

/// Skips the header row and blank cells of a single-column read.
pub fn keys_from_rows(rows: &[Vec<String>]) -> HashSet<String> {
    rows.iter()
        .skip(1)
        .filter_map(|r| r.first())
        .filter(|v| !v.is_empty())
        .cloned()
        .collect()
}

/// One-based sheet row of `source_id` in a column-A read (header included).
pub fn source_row_number(rows: &[Vec<String>], source_id: &str) -> Option<usize> {
    rows.iter()
        .position(|r| r.first().map(String::as_str) == Some(source_id))
        .map(|idx| idx + 1)
}

fn column_letter(idx: usize) -> char {
    (b'A' + idx as u8) as char
}

#[async_trait]
impl RecordStore for SheetsStore {
    async fn list_active_sources(&self) -> Result<Vec<SourceDescriptor>, PipelineError> {
        let rows = self
            .get_values(&format!("{}!A:H", self.sources_tab))
            .await
            .map_err(PipelineError::store)?;
        Ok(active_sources_from_rows(&rows))
    }

    async fn list_existing_keys(&self) -> Result<HashSet<String>, PipelineError> {
        let col = column_letter(ITEM_URL_COLUMN);
        let rows = self
            .get_values(&format!("{}!{col}:{col}", self.items_tab))
            .await
            .map_err(PipelineError::store)?;
        Ok(keys_from_rows(&rows))
    }

    async fn persist(&self, records: &[CandidateRecord]) -> Result<usize, PipelineError> {
        if records.is_empty() {
            return Ok(0);
        }
        let now = format_timestamp(&now_in(self.utc_offset));
        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|r| item_row(generate_id(ITEM_ID_PREFIX), r, &now))
            .collect();
        let updated = self
            .append_rows(&format!("{}!A:P", self.items_tab), &rows)
            .await
            .map_err(PipelineError::persist)?;
        Ok(updated.unwrap_or(rows.len()))
    }

    async fn touch_source_timestamp(
        &self,
        source_id: &str,
        at: DateTime<FixedOffset>,
    ) -> Result<(), PipelineError> {
        let ids = self
            .get_values(&format!("{}!A:A", self.sources_tab))
            .await
            .map_err(PipelineError::store)?;
        let Some(row) = source_row_number(&ids, source_id) else {
            tracing::warn!(source_id, "source not found in sources tab");
            return Ok(());
        };
        self.update_cell(
            &format!("{}!{SOURCE_TIMESTAMP_COLUMN}{row}", self.sources_tab),
            format_timestamp(&at),
        )
        .await
        .map_err(PipelineError::store)
    }

    async fn append_log(&self, entry: &LogEntry) -> Result<(), PipelineError> {
        let now = format_timestamp(&now_in(self.utc_offset));
        let row = log_row(generate_id(LOG_ID_PREFIX), &now, entry);
        self.append_rows(&format!("{}!A:F", self.logs_tab), &[row])
            .await
            .map(|_| ())
            .map_err(PipelineError::store)
    }
}
