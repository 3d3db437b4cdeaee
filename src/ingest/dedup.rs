//! Run-scoped duplicate filter keyed by item URL.
//!
//! Seeded once from the URLs already in the store, then grows with every
//! accepted record, so a repeat of a post within the same run is rejected
//! exactly like a repeat of a post stored in an earlier run.
//!
//! Posts without a discoverable link share their page URL as key and collide
//! with each other; only the first of them is kept.

use std::collections::HashSet;

use crate::ingest::types::CandidateRecord;

#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the working set with the keys already recorded.
    pub fn seed<I>(&mut self, existing: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.seen = existing.into_iter().collect();
    }

    /// `true` if the record's URL is new (and is now remembered).
    pub fn accept(&mut self, record: &CandidateRecord) -> bool {
        self.seen.insert(record.url.clone())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
