// src/ingest/types.rs
use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::error::PipelineError;

/// One configured page, as listed in the store's sources tab.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub source_id: String,
    pub source_name: String,
    pub source_type: String,
    pub url: String, // full URL or a bare page handle
    pub is_active: bool,
    #[serde(default)]
    pub scrape_selector: String,
    #[serde(default)]
    pub last_scraped: String,
    #[serde(default)]
    pub notes: String,
}

/// One unit of scraped text with the post link found next to it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub text: String,
    pub link: Option<String>,
}

/// Sanitized, structured item that has not been deduplicated yet.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CandidateRecord {
    pub source_id: String,
    pub title_th: String,
    pub description_th: String,
    pub url: String,
    pub deadline: String,
    pub grant_amount: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Error,
    Skip,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Error => "error",
            LogLevel::Skip => "skip",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row for the run log side channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub actor: String,
    pub level: LogLevel,
    pub message: String,
    pub source_id: Option<String>,
}

/// Produces raw blocks for one source over an authenticated session.
#[async_trait::async_trait]
pub trait SourceScraper: Send + Sync {
    async fn scrape(&self, source: &SourceDescriptor) -> Result<Vec<RawBlock>, PipelineError>;
}

/// Tabular store holding sources, items and run logs.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Only entries with `is_active == true`.
    async fn list_active_sources(&self) -> Result<Vec<SourceDescriptor>, PipelineError>;

    /// URLs already recorded as items.
    async fn list_existing_keys(&self) -> Result<HashSet<String>, PipelineError>;

    /// Append one batch; returns the number of rows written.
    async fn persist(&self, records: &[CandidateRecord]) -> Result<usize, PipelineError>;

    async fn touch_source_timestamp(
        &self,
        source_id: &str,
        at: DateTime<FixedOffset>,
    ) -> Result<(), PipelineError>;

    async fn append_log(&self, entry: &LogEntry) -> Result<(), PipelineError>;
}
