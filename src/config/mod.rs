// src/config/mod.rs
pub mod tuning;

use std::fmt;

use crate::error::PipelineError;
pub use tuning::{load_tuning_default, load_tuning_from, ScraperTuning};

pub const ENV_FB_EMAIL: &str = "FB_EMAIL";
pub const ENV_FB_PASSWORD: &str = "FB_PASSWORD";
pub const ENV_SPREADSHEET_ID: &str = "SPREADSHEET_ID";
pub const ENV_GOOGLE_CREDENTIALS: &str = "GOOGLE_CREDENTIALS";
pub const ENV_LOG_ACTOR: &str = "LOG_ACTOR";
pub const ENV_CDP_ENDPOINT: &str = "CDP_ENDPOINT";

pub const DEFAULT_LOG_ACTOR: &str = "github-actions";

const REQUIRED: &[&str] = &[
    ENV_FB_EMAIL,
    ENV_FB_PASSWORD,
    ENV_SPREADSHEET_ID,
    ENV_GOOGLE_CREDENTIALS,
];

/// Everything one run needs, resolved before any source is touched.
#[derive(Clone)]
pub struct AppConfig {
    pub fb_email: String,
    pub fb_password: String,
    pub spreadsheet_id: String,
    /// Service-account key JSON, base64-encoded or raw.
    pub google_credentials: String,
    /// Browser DevTools endpoint, from `CDP_ENDPOINT` or the tuning file.
    pub cdp_endpoint: String,
    /// Written in the actor column of every log row.
    pub log_actor: String,
    pub tuning: ScraperTuning,
}

// Secrets stay out of logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("fb_email", &self.fb_email)
            .field("fb_password", &"<redacted>")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("google_credentials", &"<redacted>")
            .field("cdp_endpoint", &self.cdp_endpoint)
            .field("log_actor", &self.log_actor)
            .field("tuning", &self.tuning)
            .finish()
    }
}

impl AppConfig {
    /// Read required settings from the process environment.
    pub fn from_env(tuning: ScraperTuning) -> Result<Self, PipelineError> {
        Self::from_lookup(|k| std::env::var(k).ok(), tuning)
    }

    /// Same as [`AppConfig::from_env`] over an arbitrary lookup; blank values
    /// count as missing and all missing names are reported at once.
    pub fn from_lookup<F>(lookup: F, tuning: ScraperTuning) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED.iter().copied().filter(|k| get(*k).is_none()).collect();
        if !missing.is_empty() {
            return Err(PipelineError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            fb_email: get(ENV_FB_EMAIL).unwrap_or_default(),
            fb_password: get(ENV_FB_PASSWORD).unwrap_or_default(),
            spreadsheet_id: get(ENV_SPREADSHEET_ID).unwrap_or_default(),
            google_credentials: get(ENV_GOOGLE_CREDENTIALS).unwrap_or_default(),
            cdp_endpoint: get(ENV_CDP_ENDPOINT).unwrap_or_else(|| tuning.cdp_endpoint.clone()),
            log_actor: get(ENV_LOG_ACTOR).unwrap_or_else(|| DEFAULT_LOG_ACTOR.to_string()),
            tuning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_names_are_listed_together() {
        let env: HashMap<&str, &str> = [(ENV_FB_EMAIL, "a@b.c"), (ENV_SPREADSHEET_ID, "  ")].into();
        let err = AppConfig::from_lookup(
            |k| env.get(k).map(|v| v.to_string()),
            ScraperTuning::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: missing required environment variables: FB_PASSWORD, SPREADSHEET_ID, GOOGLE_CREDENTIALS"
        );
    }

    #[test]
    fn debug_redacts_secrets() {
        let env: HashMap<&str, &str> = [
            (ENV_FB_EMAIL, "a@b.c"),
            (ENV_FB_PASSWORD, "hunter2"),
            (ENV_SPREADSHEET_ID, "sheet"),
            (ENV_GOOGLE_CREDENTIALS, "eyJwcml2YXRlX2tleSI6Ii4uLiJ9"),
        ]
        .into();
        let cfg = AppConfig::from_lookup(
            |k| env.get(k).map(|v| v.to_string()),
            ScraperTuning::default(),
        )
        .unwrap();
        assert_eq!(cfg.log_actor, DEFAULT_LOG_ACTOR);
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("eyJwcml2"));
        assert_eq!(cfg.cdp_endpoint, "ws://localhost:9222");
    }

    #[test]
    fn cdp_endpoint_env_overrides_tuning() {
        let env: HashMap<&str, &str> = [
            (ENV_FB_EMAIL, "a@b.c"),
            (ENV_FB_PASSWORD, "pw"),
            (ENV_SPREADSHEET_ID, "sheet"),
            (ENV_GOOGLE_CREDENTIALS, "e30="),
            (ENV_CDP_ENDPOINT, "ws://lightpanda:9222"),
        ]
        .into();
        let cfg = AppConfig::from_lookup(
            |k| env.get(k).map(|v| v.to_string()),
            ScraperTuning::default(),
        )
        .unwrap();
        assert_eq!(cfg.cdp_endpoint, "ws://lightpanda:9222");
    }
}
