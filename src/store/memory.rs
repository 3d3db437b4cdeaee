// src/store/memory.rs
use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::error::PipelineError;
use crate::ingest::types::{CandidateRecord, LogEntry, RecordStore, SourceDescriptor};

#[derive(Debug, Default)]
pub struct MemoryState {
    pub sources: Vec<SourceDescriptor>,
    pub existing_urls: HashSet<String>,
    /// One entry per `persist` call.
    pub batches: Vec<Vec<CandidateRecord>>,
    pub logs: Vec<LogEntry>,
    pub touched: Vec<(String, DateTime<FixedOffset>)>,
    /// Successful writes in call order: `"persist"`, `"touch"` or `"log"`.
    pub calls: Vec<&'static str>,
    pub fail_persist: bool,
    pub fail_logs: bool,
    pub fail_touch: bool,
}

/// In-memory store that records every call; handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new(sources: Vec<SourceDescriptor>, existing_urls: HashSet<String>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                sources,
                existing_urls,
                ..MemoryState::default()
            }),
        }
    }

    pub fn failing_persist(self) -> Self {
        self.with_state(|s| s.fail_persist = true);
        self
    }

    pub fn failing_logs(self) -> Self {
        self.with_state(|s| s.fail_logs = true);
        self
    }

    pub fn failing_touch(self) -> Self {
        self.with_state(|s| s.fail_touch = true);
        self
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    pub fn saved(&self) -> Vec<CandidateRecord> {
        self.with_state(|s| s.batches.concat())
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.with_state(|s| s.logs.clone())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_active_sources(&self) -> Result<Vec<SourceDescriptor>, PipelineError> {
        Ok(self.with_state(|s| s.sources.iter().filter(|x| x.is_active).cloned().collect()))
    }

    async fn list_existing_keys(&self) -> Result<HashSet<String>, PipelineError> {
        Ok(self.with_state(|s| {
            let mut keys = s.existing_urls.clone();
            keys.extend(s.batches.iter().flatten().map(|r| r.url.clone()));
            keys
        }))
    }

    async fn persist(&self, records: &[CandidateRecord]) -> Result<usize, PipelineError> {
        self.with_state(|s| {
            if s.fail_persist {
                return Err(PipelineError::Persist("memory store refuses writes".into()));
            }
            s.batches.push(records.to_vec());
            s.calls.push("persist");
            Ok(records.len())
        })
    }

    async fn touch_source_timestamp(
        &self,
        source_id: &str,
        at: DateTime<FixedOffset>,
    ) -> Result<(), PipelineError> {
        self.with_state(|s| {
            if s.fail_touch {
                return Err(PipelineError::Store("memory store refuses touch".into()));
            }
            s.touched.push((source_id.to_string(), at));
            s.calls.push("touch");
            Ok(())
        })
    }

    async fn append_log(&self, entry: &LogEntry) -> Result<(), PipelineError> {
        self.with_state(|s| {
            if s.fail_logs {
                return Err(PipelineError::Store("memory store refuses logs".into()));
            }
            s.logs.push(entry.clone());
            s.calls.push("log");
            Ok(())
        })
    }
}
