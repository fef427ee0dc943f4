//! Headless Chromium session using chromiumoxide.

use super::{BrowserSession, SessionCookie};
use crate::config::Config;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Find a Chrome or Chromium binary on the system.
pub fn find_chromium() -> Option<PathBuf> {
    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// A headless Chromium instance with a single page
pub struct ChromiumBrowser {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    user_agent: String,
    navigation_timeout: Duration,
}

impl ChromiumBrowser {
    /// Launch headless Chromium presenting the configured desktop user agent.
    pub async fn launch(config: &Config) -> Result<Self> {
        let chrome_path = match &config.browser.chromium_path {
            Some(path) => path.clone(),
            None => find_chromium()
                .context("Chromium not found. Install Chrome or set SSE_CHROMIUM_PATH")?,
        };
        debug!("Launching Chromium from {}", chrome_path.display());

        let browser_config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", config.http.user_agent))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        Ok(Self {
            browser,
            page,
            handler,
            user_agent: config.http.user_agent.clone(),
            navigation_timeout: config.navigation_timeout(),
        })
    }
}

#[async_trait]
impl BrowserSession for ChromiumBrowser {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let result = tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await;

        match result {
            Ok(Ok(_)) => Ok(()),
            // Documents served as attachments abort the navigation after the
            // cookies have been set.
            Ok(Err(e)) if e.to_string().contains("ERR_ABORTED") => {
                debug!("Navigation to {} handed off as a download", url);
                Ok(())
            }
            Ok(Err(e)) => bail!("navigation to {url} failed: {e}"),
            Err(_) => bail!(
                "navigation to {url} timed out after {}s",
                self.navigation_timeout.as_secs()
            ),
        }
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .context("failed to read browser cookies")?;

        Ok(cookies
            .into_iter()
            .map(|c| SessionCookie::new(c.name, c.value))
            .collect())
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut this = *self;
        let closed = this.browser.close().await;
        let _ = this.browser.wait().await;
        this.handler.abort();
        closed.context("failed to close Chromium")?;
        Ok(())
    }
}
