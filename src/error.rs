// src/error.rs
use thiserror::Error;

/// Failure taxonomy for one scraping run.
///
/// `Scrape` is recovered per source by the coordinator; every other variant
/// ends the run with a non-zero exit status.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("scrape failed: {0}")]
    Scrape(String),

    #[error("persist failed: {0}")]
    Persist(String),

    #[error("store read failed: {0}")]
    Store(String),
}

impl PipelineError {
    /// Fatal errors abort the run; only scrape failures are isolated per source.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PipelineError::Scrape(_))
    }

    pub(crate) fn scrape(err: anyhow::Error) -> Self {
        PipelineError::Scrape(format!("{err:#}"))
    }

    pub(crate) fn store(err: anyhow::Error) -> Self {
        PipelineError::Store(format!("{err:#}"))
    }

    pub(crate) fn persist(err: anyhow::Error) -> Self {
        PipelineError::Persist(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_scrape_errors_are_recoverable() {
        assert!(!PipelineError::Scrape("timeout".into()).is_fatal());
        assert!(PipelineError::Auth("checkpoint".into()).is_fatal());
        assert!(PipelineError::Config("FB_EMAIL".into()).is_fatal());
        assert!(PipelineError::Persist("quota".into()).is_fatal());
        assert!(PipelineError::Store("403".into()).is_fatal());
    }

    #[test]
    fn anyhow_chain_is_flattened_into_message() {
        let err = anyhow::anyhow!("connection reset").context("GET page");
        let e = PipelineError::scrape(err);
        assert_eq!(e.to_string(), "scrape failed: GET page: connection reset");
    }
}
