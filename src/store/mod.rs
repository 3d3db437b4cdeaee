//! Row layout shared by every tabular store.
//!
//! Items tab (A:P):
//! `id, source_id, title_th, title_en, description_th, description_en, url,
//! category, deadline, grant_amount, suitability_score, suitability_reason,
//! scraped_at, processed, is_sent, sent_at`.
//! The English columns, score, reason and the sent flags are filled by a
//! later processing stage; this crate writes them blank or at their defaults.
//!
//! Sources tab (A:H): `id, name, type, url, scrape_selector, is_active,
//! last_scraped, notes`. Logs tab (A:F): `id, timestamp, actor, source_id,
//! level, message`.

pub mod memory;
pub mod sheets;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use rand::Rng;

use crate::ingest::types::{CandidateRecord, LogEntry, SourceDescriptor};

pub const ITEM_ID_PREFIX: &str = "ITM";
pub const LOG_ID_PREFIX: &str = "LOG";
pub const DEFAULT_CATEGORY: &str = "pending";
pub const SHEET_FALSE: &str = "FALSE";

/// Column of the item URL in the items tab (zero-based G).
pub const ITEM_URL_COLUMN: usize = 6;
/// Column of the last-scraped timestamp in the sources tab.
pub const SOURCE_TIMESTAMP_COLUMN: &str = "G";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn now_in(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// `PREFIX` + base-36 millisecond clock + 4 random base-36 chars, upper-cased.
pub fn generate_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::rng();
    let suffix: String = (0..4)
        .map(|_| to_base36(rng.random_range(0..36u64)))
        .collect();
    format!("{prefix}{}{suffix}", to_base36(millis)).to_uppercase()
}

pub fn item_row(id: String, record: &CandidateRecord, scraped_at: &str) -> Vec<String> {
    vec![
        id,
        record.source_id.clone(),
        record.title_th.clone(),
        String::new(),
        record.description_th.clone(),
        String::new(),
        record.url.clone(),
        DEFAULT_CATEGORY.to_string(),
        record.deadline.clone(),
        record.grant_amount.clone(),
        String::new(),
        String::new(),
        scraped_at.to_string(),
        SHEET_FALSE.to_string(),
        SHEET_FALSE.to_string(),
        String::new(),
    ]
}

pub fn log_row(id: String, at: &str, entry: &LogEntry) -> Vec<String> {
    vec![
        id,
        at.to_string(),
        entry.actor.clone(),
        entry.source_id.clone().unwrap_or_default(),
        entry.level.as_str().to_string(),
        entry.message.clone(),
    ]
}

/// Missing trailing cells read as empty strings.
pub fn source_from_row(row: &[String]) -> SourceDescriptor {
    let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
    SourceDescriptor {
        source_id: cell(0),
        source_name: cell(1),
        source_type: cell(2),
        url: cell(3),
        scrape_selector: cell(4),
        is_active: cell(5).trim().eq_ignore_ascii_case("true"),
        last_scraped: cell(6),
        notes: cell(7),
    }
}
