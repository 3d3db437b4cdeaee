// src/ingest/mod.rs
pub mod dedup;
pub mod providers;
pub mod record;
pub mod types;

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use rand::Rng;

use crate::error::PipelineError;
use crate::ingest::dedup::Deduplicator;
use crate::ingest::record::{build_record, DEFAULT_PLATFORM_BASE_URL};
use crate::ingest::types::{
    CandidateRecord, LogEntry, LogLevel, RecordStore, SourceDescriptor, SourceScraper,
};

/// One-time metrics registration (so series show up once a recorder exists).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "scrape_sources_total",
            "Sources processed, labelled by outcome."
        );
        describe_counter!(
            "scrape_items_found_total",
            "Candidate records built from scraped blocks."
        );
        describe_counter!(
            "scrape_items_skipped_total",
            "Candidate records rejected as duplicates."
        );
        describe_counter!("scrape_items_saved_total", "Rows appended to the store.");
        describe_counter!(
            "scrape_store_errors_total",
            "Best-effort store writes that failed."
        );
    });
}

/// Bounds for the randomized pause between two sources, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const NONE: DelayRange = DelayRange {
        min_ms: 0,
        max_ms: 0,
    };

    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        if min_ms > max_ms {
            Self {
                min_ms: max_ms,
                max_ms: min_ms,
            }
        } else {
            Self { min_ms, max_ms }
        }
    }

    pub fn pick(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunStats {
    pub sources_processed: usize,
    pub sources_success: usize,
    pub sources_failed: usize,
    pub items_found: usize,
    pub items_saved: usize,
    pub items_skipped: usize,
}

impl RunStats {
    pub fn summary_message(&self) -> String {
        format!(
            "Completed: {}/{} sources, {} new items saved",
            self.sources_success, self.sources_processed, self.items_saved
        )
    }
}

/// Where one source is in its pass through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Pending,
    Scraping,
    Extracting,
    Deduplicating,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source_id: String,
    pub state: SourceState,
    pub found: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub error: Option<String>,
}

impl SourceReport {
    fn pending(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            state: SourceState::Pending,
            found: 0,
            accepted: 0,
            skipped: 0,
            error: None,
        }
    }

    fn advance(&mut self, next: SourceState) {
        tracing::debug!(source_id = %self.source_id, from = ?self.state, to = ?next, "source state");
        self.state = next;
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub stats: RunStats,
    pub sources: Vec<SourceReport>,
    /// Records handed to the store, in acceptance order.
    pub saved: Vec<CandidateRecord>,
}

/// Sources to visit plus the seeded duplicate set.
#[derive(Debug)]
pub struct RunPlan {
    pub sources: Vec<SourceDescriptor>,
    pub dedup: Deduplicator,
}

/// Drives one run: sources in order, one at a time, then one batched save.
pub struct Coordinator<'a> {
    store: &'a dyn RecordStore,
    actor: String,
    delay: DelayRange,
    platform_base_url: String,
    utc_offset: FixedOffset,
}

impl<'a> Coordinator<'a> {
    pub fn new(store: &'a dyn RecordStore, actor: impl Into<String>) -> Self {
        Self {
            store,
            actor: actor.into(),
            delay: DelayRange::NONE,
            platform_base_url: DEFAULT_PLATFORM_BASE_URL.to_string(),
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_delay(mut self, delay: DelayRange) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_platform_base_url(mut self, base: impl Into<String>) -> Self {
        self.platform_base_url = base.into();
        self
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    fn now(&self) -> DateTime<FixedOffset> {
        crate::store::now_in(self.utc_offset)
    }

    /// Load active sources and seed the duplicate set.
    ///
    /// `Ok(None)` means there is nothing to scrape; an info entry has been
    /// logged and no platform session needs to be opened.
    pub async fn prepare(&self) -> Result<Option<RunPlan>, PipelineError> {
        ensure_metrics_described();

        let sources: Vec<SourceDescriptor> = self
            .store
            .list_active_sources()
            .await?
            .into_iter()
            .filter(|s| s.is_active)
            .collect();
        tracing::info!(count = sources.len(), "active sources loaded");

        if sources.is_empty() {
            tracing::warn!("no active sources found");
            self.log(LogLevel::Info, "No active sources found".to_string(), None)
                .await;
            return Ok(None);
        }

        let existing = self.store.list_existing_keys().await?;
        tracing::info!(count = existing.len(), "existing item urls loaded");
        let mut dedup = Deduplicator::new();
        dedup.seed(existing);

        Ok(Some(RunPlan { sources, dedup }))
    }

    /// Scrape every planned source, then save all new records in one batch.
    ///
    /// A fatal error from the scraper stops the loop; records accepted so far
    /// are still saved before that error is returned.
    pub async fn execute(
        &self,
        plan: RunPlan,
        scraper: &dyn SourceScraper,
    ) -> Result<RunReport, PipelineError> {
        ensure_metrics_described();

        let RunPlan { sources, mut dedup } = plan;
        let mut report = RunReport::default();
        let mut accepted: Vec<CandidateRecord> = Vec::new();
        let mut aborted: Option<PipelineError> = None;

        for (idx, source) in sources.iter().enumerate() {
            if idx > 0 {
                let pause = self.delay.pick();
                if !pause.is_zero() {
                    tracing::info!(delay_ms = pause.as_millis() as u64, "waiting before next source");
                    tokio::time::sleep(pause).await;
                }
            }

            report.stats.sources_processed += 1;
            let src_report = match self
                .process_source(source, scraper, &mut dedup, &mut accepted)
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    // No further sources; accepted records are still saved below.
                    report.stats.sources_failed += 1;
                    counter!("scrape_sources_total", "outcome" => "failed").increment(1);
                    aborted = Some(e);
                    break;
                }
            };

            let (level, message) = match src_report.state {
                SourceState::Done => {
                    report.stats.sources_success += 1;
                    report.stats.items_found += src_report.found;
                    report.stats.items_skipped += src_report.skipped;
                    counter!("scrape_sources_total", "outcome" => "ok").increment(1);
                    counter!("scrape_items_found_total").increment(src_report.found as u64);
                    counter!("scrape_items_skipped_total").increment(src_report.skipped as u64);

                    if src_report.found > 0 && src_report.accepted == 0 {
                        (
                            LogLevel::Skip,
                            format!(
                                "Scraped {} items, 0 new (all duplicates)",
                                src_report.found
                            ),
                        )
                    } else {
                        (
                            LogLevel::Success,
                            format!(
                                "Scraped {} items, {} new",
                                src_report.found, src_report.accepted
                            ),
                        )
                    }
                }
                _ => {
                    report.stats.sources_failed += 1;
                    counter!("scrape_sources_total", "outcome" => "failed").increment(1);
                    let reason = src_report.error.as_deref().unwrap_or("unknown error");
                    (LogLevel::Error, format!("Failed: {reason}"))
                }
            };

            self.touch(&source.source_id).await;
            self.log(level, message, Some(&source.source_id)).await;
            report.sources.push(src_report);
        }

        if accepted.is_empty() {
            tracing::info!("no new items to save");
        } else {
            let saved = self.store.persist(&accepted).await?;
            report.stats.items_saved = saved;
            counter!("scrape_items_saved_total").increment(saved as u64);
            tracing::info!(saved, "new items saved");
        }
        if let Some(err) = aborted {
            return Err(err);
        }
        report.saved = accepted;

        let s = &report.stats;
        tracing::info!(
            sources_processed = s.sources_processed,
            sources_success = s.sources_success,
            sources_failed = s.sources_failed,
            items_found = s.items_found,
            items_saved = s.items_saved,
            items_skipped = s.items_skipped,
            "run summary"
        );
        self.log(LogLevel::Success, report.stats.summary_message(), None)
            .await;

        Ok(report)
    }

    /// `prepare` followed by `execute` over an already authenticated scraper.
    pub async fn run_once(&self, scraper: &dyn SourceScraper) -> Result<RunReport, PipelineError> {
        match self.prepare().await? {
            Some(plan) => self.execute(plan, scraper).await,
            None => Ok(RunReport::default()),
        }
    }

    /// Best-effort error entry for an error that ends the run.
    pub async fn record_fatal(&self, err: &PipelineError) {
        self.log(LogLevel::Error, format!("Fatal: {err}"), None).await;
    }

    async fn process_source(
        &self,
        source: &SourceDescriptor,
        scraper: &dyn SourceScraper,
        dedup: &mut Deduplicator,
        accepted: &mut Vec<CandidateRecord>,
    ) -> Result<SourceReport, PipelineError> {
        let mut rep = SourceReport::pending(&source.source_id);
        tracing::info!(source_id = %source.source_id, name = %source.source_name, url = %source.url, "scraping source");

        rep.advance(SourceState::Scraping);
        let blocks = match scraper.scrape(source).await {
            Ok(b) => b,
            Err(e) if e.is_fatal() => {
                tracing::error!(source_id = %source.source_id, error = %e, "fatal error while scraping");
                return Err(e);
            }
            Err(e) => {
                tracing::error!(source_id = %source.source_id, error = %e, "source failed");
                rep.error = Some(e.to_string());
                rep.advance(SourceState::Failed);
                return Ok(rep);
            }
        };

        rep.advance(SourceState::Extracting);
        let candidates: Vec<CandidateRecord> = blocks
            .iter()
            .filter_map(|b| build_record(source, b, &self.platform_base_url))
            .collect();
        rep.found = candidates.len();
        tracing::info!(source_id = %source.source_id, blocks = blocks.len(), valid = rep.found, "blocks processed");

        rep.advance(SourceState::Deduplicating);
        for rec in candidates {
            if dedup.accept(&rec) {
                rep.accepted += 1;
                accepted.push(rec);
            } else {
                rep.skipped += 1;
            }
        }
        tracing::info!(source_id = %source.source_id, new = rep.accepted, duplicates = rep.skipped, "source done");

        rep.advance(SourceState::Done);
        Ok(rep)
    }

    async fn touch(&self, source_id: &str) {
        if let Err(e) = self.store.touch_source_timestamp(source_id, self.now()).await {
            tracing::warn!(source_id, error = %e, "timestamp update failed");
            counter!("scrape_store_errors_total").increment(1);
        }
    }

    async fn log(&self, level: LogLevel, message: String, source_id: Option<&str>) {
        let entry = LogEntry {
            actor: self.actor.clone(),
            level,
            message,
            source_id: source_id.map(str::to_string),
        };
        if let Err(e) = self.store.append_log(&entry).await {
            tracing::warn!(level = %entry.level, error = %e, "log append failed");
            counter!("scrape_store_errors_total").increment(1);
        }
    }
}
