use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::config::ScraperTuning;
use crate::error::PipelineError;
use crate::ingest::providers::page_html::extract_blocks;
use crate::ingest::record::resolve_page_url;
use crate::ingest::types::{RawBlock, SourceDescriptor, SourceScraper};
use crate::ingest::DelayRange;

/// Scrolls two viewports down so the feed loads more posts.
pub const SCROLL_SCRIPT: &str = "window.scrollBy(0, window.innerHeight * 2)";

const EMAIL_INPUT: &str = r#"input[name="email"]"#;
const PASSWORD_INPUT: &str = r#"input[name="pass"]"#;
const LOGIN_BUTTON: &str = r#"button[name="login"]"#;

/// Pause between keystroke-level actions on the login form.
const FIELD_PAUSE: Duration = Duration::from_millis(500);

/// The platform bounced the session to a login or verification page.
pub fn lands_on_login(url: &str) -> bool {
    url.contains("login") || url.contains("checkpoint")
}

/// Authenticated page session driven over the Chrome DevTools Protocol.
///
/// Constructed with [`BrowserSession::connect`], authenticated with
/// [`BrowserSession::login`] and released with [`BrowserSession::close`].
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    base_url: String,
    login_url: String,
    max_posts: usize,
    scroll_count: u32,
    timeout: Duration,
    pause: DelayRange,
}

impl BrowserSession {
    /// Attach to a running browser at `endpoint` (`ws://` or `http://`).
    pub async fn connect(endpoint: &str, tuning: &ScraperTuning) -> Result<Self, PipelineError> {
        let timeout = Duration::from_millis(tuning.timeout_ms);
        let (browser, mut events) = tokio::time::timeout(timeout, Browser::connect(endpoint))
            .await
            .map_err(|_| PipelineError::Auth(format!("connecting to {endpoint} timed out")))?
            .map_err(|e| PipelineError::Auth(format!("connecting to {endpoint}: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "cdp handler event failed");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(PipelineError::Auth(format!("opening browser page: {e}")));
            }
        };
        if let Err(e) = page
            .set_user_agent(SetUserAgentOverrideParams::new(tuning.user_agent.clone()))
            .await
        {
            tracing::warn!(error = %e, "user agent override rejected");
        }
        tracing::info!(endpoint, "browser session connected");

        Ok(Self {
            browser,
            handler,
            page,
            base_url: tuning.platform_base_url.clone(),
            login_url: tuning.login_url.clone(),
            max_posts: tuning.max_posts,
            scroll_count: tuning.scroll_count,
            timeout,
            pause: tuning.delay_range(),
        })
    }

    /// Fill and submit the login form; any landing on a login or checkpoint page is a failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), PipelineError> {
        if email.is_empty() || password.is_empty() {
            return Err(PipelineError::Auth("credentials not provided".into()));
        }
        self.submit_login(email, password)
            .await
            .map_err(|e| PipelineError::Auth(format!("{e:#}")))
    }

    async fn submit_login(&self, email: &str, password: &str) -> Result<()> {
        self.navigate(&self.login_url).await?;
        self.settle().await;

        self.page
            .find_element(EMAIL_INPUT)
            .await
            .context("email field")?
            .click()
            .await?
            .type_str(email)
            .await
            .context("typing email")?;
        tokio::time::sleep(FIELD_PAUSE).await;

        self.page
            .find_element(PASSWORD_INPUT)
            .await
            .context("password field")?
            .click()
            .await?
            .type_str(password)
            .await
            .context("typing password")?;
        tokio::time::sleep(FIELD_PAUSE).await;

        self.page
            .find_element(LOGIN_BUTTON)
            .await
            .context("login button")?
            .click()
            .await
            .context("submitting login form")?;

        // Navigation is not always reported; the landing URL decides.
        if tokio::time::timeout(self.timeout, self.page.wait_for_navigation())
            .await
            .is_err()
        {
            tracing::debug!("no navigation event after login submit");
        }
        self.settle().await;

        let landed = self.current_url().await?;
        if lands_on_login(&landed) {
            anyhow::bail!("still on {landed}; verification required or credentials rejected");
        }
        tracing::info!("logged in");
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        tokio::time::timeout(self.timeout, self.page.goto(url))
            .await
            .with_context(|| format!("loading {url} timed out"))?
            .with_context(|| format!("loading {url}"))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self
            .page
            .url()
            .await
            .context("reading page url")?
            .unwrap_or_default())
    }

    async fn settle(&self) {
        let pause = self.pause.pick();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    /// Load a page, scroll it `scroll_count` times, and return the rendered HTML.
    async fn load_rendered(&self, url: &str) -> Result<String, PipelineError> {
        self.navigate(url).await.map_err(PipelineError::scrape)?;
        self.settle().await;

        for _ in 0..self.scroll_count {
            self.page
                .evaluate(SCROLL_SCRIPT)
                .await
                .map_err(|e| PipelineError::Scrape(format!("scrolling {url}: {e}")))?;
            self.settle().await;
        }

        let landed = self.current_url().await.map_err(PipelineError::scrape)?;
        if lands_on_login(&landed) {
            return Err(PipelineError::Auth(format!(
                "redirected to {landed}; session no longer authenticated"
            )));
        }

        self.page
            .content()
            .await
            .map_err(|e| PipelineError::Scrape(format!("reading content of {url}: {e}")))
    }

    /// Close the page and drop the connection; the remote browser keeps running.
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            tracing::warn!(error = %e, "closing browser page failed");
        }
        drop(self.browser);
        self.handler.abort();
        tracing::info!("browser session closed");
    }
}

#[async_trait]
impl SourceScraper for BrowserSession {
    async fn scrape(&self, source: &SourceDescriptor) -> Result<Vec<RawBlock>, PipelineError> {
        let url = resolve_page_url(&source.url, &self.base_url);
        let html = self.load_rendered(&url).await?;
        let blocks = extract_blocks(&html, &self.base_url, self.max_posts);
        tracing::info!(source_id = %source.source_id, blocks = blocks.len(), "page blocks extracted");
        Ok(blocks)
    }
}
