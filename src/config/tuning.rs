// src/config/tuning.rs
use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::record::DEFAULT_PLATFORM_BASE_URL;
use crate::ingest::DelayRange;

pub const ENV_TUNING_PATH: &str = "SCRAPER_CONFIG_PATH";

fn default_max_posts() -> usize {
    10
}
fn default_scroll_count() -> u32 {
    3
}
fn default_cdp_endpoint() -> String {
    "ws://localhost:9222".to_string()
}
fn default_delay_min_ms() -> u64 {
    2_000
}
fn default_delay_max_ms() -> u64 {
    5_000
}
fn default_timeout_ms() -> u64 {
    30_000
}
/// Asia/Bangkok; no DST, so a fixed offset is exact.
fn default_utc_offset_hours() -> i32 {
    7
}
fn default_platform_base_url() -> String {
    DEFAULT_PLATFORM_BASE_URL.to_string()
}
fn default_login_url() -> String {
    format!("{DEFAULT_PLATFORM_BASE_URL}/login")
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}
fn default_sources_tab() -> String {
    "Sources".to_string()
}
fn default_items_tab() -> String {
    "Items".to_string()
}
fn default_logs_tab() -> String {
    "Logs".to_string()
}

/// Scraping and store knobs that have sane defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScraperTuning {
    /// Blocks taken per page.
    #[serde(default = "default_max_posts")]
    pub max_posts: usize,
    /// Viewport scrolls before a page's posts are read.
    #[serde(default = "default_scroll_count")]
    pub scroll_count: u32,
    /// DevTools endpoint of the browser to attach to; `CDP_ENDPOINT` overrides it.
    #[serde(default = "default_cdp_endpoint")]
    pub cdp_endpoint: String,
    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,
    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,
    /// Per-request timeout for page loads.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default = "default_platform_base_url")]
    pub platform_base_url: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_sources_tab")]
    pub sources_tab: String,
    #[serde(default = "default_items_tab")]
    pub items_tab: String,
    #[serde(default = "default_logs_tab")]
    pub logs_tab: String,
}

impl Default for ScraperTuning {
    fn default() -> Self {
        Self {
            max_posts: default_max_posts(),
            scroll_count: default_scroll_count(),
            cdp_endpoint: default_cdp_endpoint(),
            delay_min_ms: default_delay_min_ms(),
            delay_max_ms: default_delay_max_ms(),
            timeout_ms: default_timeout_ms(),
            utc_offset_hours: default_utc_offset_hours(),
            platform_base_url: default_platform_base_url(),
            login_url: default_login_url(),
            user_agent: default_user_agent(),
            sources_tab: default_sources_tab(),
            items_tab: default_items_tab(),
            logs_tab: default_logs_tab(),
        }
    }
}

impl ScraperTuning {
    pub fn delay_range(&self) -> DelayRange {
        DelayRange::new(self.delay_min_ms, self.delay_max_ms)
    }

    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    fn sanitized(mut self) -> Self {
        if self.delay_min_ms > self.delay_max_ms {
            std::mem::swap(&mut self.delay_min_ms, &mut self.delay_max_ms);
        }
        if self.max_posts == 0 {
            self.max_posts = default_max_posts();
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            self.utc_offset_hours = default_utc_offset_hours();
        }
        self
    }
}

/// Load tuning from an explicit path. Supports TOML or JSON formats.
pub fn load_tuning_from(path: &Path) -> Result<ScraperTuning> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading scraper config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let tuning: ScraperTuning = match ext.as_str() {
        "json" => serde_json::from_str(&content).context("parsing scraper config json")?,
        "toml" => toml::from_str(&content).context("parsing scraper config toml")?,
        other => return Err(anyhow!("unsupported scraper config format: {other:?}")),
    };
    Ok(tuning.sanitized())
}

/// Load tuning using env var + fallbacks:
/// 1) $SCRAPER_CONFIG_PATH
/// 2) config/scraper.toml
/// 3) config/scraper.json
/// 4) built-in defaults
pub fn load_tuning_default() -> Result<ScraperTuning> {
    if let Ok(p) = std::env::var(ENV_TUNING_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_tuning_from(&pb);
        } else {
            return Err(anyhow!("{ENV_TUNING_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/scraper.toml");
    if toml_p.exists() {
        return load_tuning_from(&toml_p);
    }
    let json_p = PathBuf::from("config/scraper.json");
    if json_p.exists() {
        return load_tuning_from(&json_p);
    }
    Ok(ScraperTuning::default())
}
