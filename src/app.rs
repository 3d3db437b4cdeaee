// src/app.rs
use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::ingest::providers::browser::BrowserSession;
use crate::ingest::{Coordinator, RunPlan, RunReport};
use crate::store::sheets::{service_account, SheetsStore};

/// One full run against the live platform and spreadsheet.
///
/// Fatal errors are also written to the store's log tab (best-effort)
/// before they are returned.
pub async fn run(cfg: &AppConfig) -> Result<RunReport, PipelineError> {
    let auth = service_account(&cfg.google_credentials)?;
    let store = SheetsStore::new(&cfg.spreadsheet_id, auth, &cfg.tuning)?;
    let coordinator = Coordinator::new(&store, cfg.log_actor.as_str())
        .with_delay(cfg.tuning.delay_range())
        .with_platform_base_url(cfg.tuning.platform_base_url.as_str())
        .with_utc_offset(cfg.tuning.utc_offset());

    let result = match coordinator.prepare().await {
        Ok(Some(plan)) => run_with_session(&coordinator, plan, cfg).await,
        Ok(None) => {
            info!("nothing to scrape");
            Ok(RunReport::default())
        }
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        error!(error = %e, "run aborted");
        coordinator.record_fatal(e).await;
    }
    result
}

/// Attaches the browser session, runs the plan, and closes the session on every path.
async fn run_with_session(
    coordinator: &Coordinator<'_>,
    plan: RunPlan,
    cfg: &AppConfig,
) -> Result<RunReport, PipelineError> {
    let session = BrowserSession::connect(&cfg.cdp_endpoint, &cfg.tuning).await?;
    let result = match session.login(&cfg.fb_email, &cfg.fb_password).await {
        Ok(()) => coordinator.execute(plan, &session).await,
        Err(e) => Err(e),
    };
    session.close().await;
    result
}
