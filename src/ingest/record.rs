// src/ingest/record.rs
use crate::extract::{extract_amount, extract_deadline};
use crate::ingest::types::{CandidateRecord, RawBlock, SourceDescriptor};
use crate::sanitize::sanitize;

/// Raw blocks shorter than this (in chars) are not posts.
pub const MIN_RAW_CHARS: usize = 50;
/// Sanitized titles shorter than this carry no useful content.
pub const MIN_TITLE_CHARS: usize = 20;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_CONTENT_CHARS: usize = 3000;

pub const DEFAULT_PLATFORM_BASE_URL: &str = "https://www.facebook.com";

/// Absolute URL of a source page; bare page handles are joined to `base`.
pub fn resolve_page_url(source_url: &str, base: &str) -> String {
    if source_url.starts_with("http") {
        source_url.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            source_url.trim_start_matches('/')
        )
    }
}

fn take_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Turn one scraped block into a candidate record, or drop it.
///
/// Returns `None` for blocks that are too short to be posts and for blocks
/// whose sanitized title ends up too short. Pure: the duplicate set and the
/// store are not touched here.
pub fn build_record(
    source: &SourceDescriptor,
    block: &RawBlock,
    platform_base_url: &str,
) -> Option<CandidateRecord> {
    if block.text.chars().count() < MIN_RAW_CHARS {
        return None;
    }

    let title_raw = block
        .text
        .lines()
        .find(|l| !l.trim().is_empty())
        .map(|l| take_chars(l, MAX_TITLE_CHARS))
        .unwrap_or_else(|| take_chars(&block.text, MAX_TITLE_CHARS));
    let content_raw = take_chars(&block.text, MAX_CONTENT_CHARS);

    let title_th = sanitize(&title_raw);
    if title_th.chars().count() < MIN_TITLE_CHARS {
        return None;
    }
    let description_th = sanitize(&content_raw);

    let url = match block.link.as_deref() {
        Some(link) if !link.is_empty() => link.to_string(),
        _ => resolve_page_url(&source.url, platform_base_url),
    };

    Some(CandidateRecord {
        source_id: source.source_id.clone(),
        deadline: extract_deadline(&description_th),
        grant_amount: extract_amount(&description_th),
        title_th,
        description_th,
        url,
    })
}
