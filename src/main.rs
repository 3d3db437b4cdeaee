//! Page opportunity scraper: one run per invocation.
//! Reads settings from the environment (and `.env`), scrapes every active
//! source once, appends new items to the spreadsheet and exits.

use opportunity_scraper::config::{load_tuning_default, AppConfig};
use opportunity_scraper::PipelineError;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false))
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env in local runs; no-op in CI where env is injected.
    let _ = dotenvy::dotenv();
    init_tracing();

    info!(started_at = %chrono::Utc::now().to_rfc3339(), "opportunity scraper starting");

    let cfg = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "configuration invalid");
            std::process::exit(1);
        }
    };

    match opportunity_scraper::app::run(&cfg).await {
        Ok(report) => {
            let s = report.stats;
            info!(
                sources_processed = s.sources_processed,
                sources_success = s.sources_success,
                sources_failed = s.sources_failed,
                items_found = s.items_found,
                items_saved = s.items_saved,
                items_skipped = s.items_skipped,
                "scraping completed"
            );
        }
        Err(e) => {
            error!(error = %e, "fatal error");
            std::process::exit(1);
        }
    }
}

fn load_config() -> Result<AppConfig, PipelineError> {
    let tuning = load_tuning_default().map_err(|e| PipelineError::Config(format!("{e:#}")))?;
    AppConfig::from_env(tuning)
}
