// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod sanitize;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::error::PipelineError;
pub use crate::extract::{extract_amount, extract_deadline};
pub use crate::ingest::dedup::Deduplicator;
pub use crate::ingest::record::build_record;
pub use crate::ingest::types::{
    CandidateRecord, LogEntry, LogLevel, RawBlock, RecordStore, SourceDescriptor, SourceScraper,
};
pub use crate::ingest::{Coordinator, RunReport, RunStats};
pub use crate::sanitize::sanitize;
