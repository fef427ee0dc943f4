//! Run orchestration: session bootstrap, listing retrieval, sequential downloads

use crate::browser::{self, BrowserSession, ChromiumBrowser};
use crate::config::Config;
use crate::models::{Announcement, DownloadRequest, DownloadResult, RunSummary};
use crate::sse::{self, AnnouncementFetcher, DateRange};
use crate::storage;
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::Path;
use tracing::{info, warn};

/// Launch headless Chromium and run a full retrieval and download job
pub async fn download_documents(request: &DownloadRequest, config: &Config) -> Result<RunSummary> {
    println!("\n--- Starting headless browser to obtain a session ---");
    let browser = ChromiumBrowser::launch(config).await?;

    Orchestrator::new(config.clone())
        .run(Box::new(browser), request)
        .await
}

/// Wires the session, listing and download steps together for one run
pub struct Orchestrator {
    config: Config,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the job with `browser`, which is closed before returning whether
    /// or not the run succeeded.
    pub async fn run(
        &self,
        mut browser: Box<dyn BrowserSession>,
        request: &DownloadRequest,
    ) -> Result<RunSummary> {
        let result = self.run_with_browser(browser.as_mut(), request).await;

        match browser.close().await {
            Ok(()) => println!("Browser closed."),
            Err(e) => warn!("Failed to close browser: {:#}", e),
        }

        result
    }

    async fn run_with_browser(
        &self,
        browser: &mut dyn BrowserSession,
        request: &DownloadRequest,
    ) -> Result<RunSummary> {
        let credential = browser::bootstrap(browser, &self.config)
            .await
            .context("Failed to obtain an initial session")?;
        println!(
            "Obtained {} initial cookies, fetching the announcement list...",
            credential.cookie_count()
        );

        let client =
            credential.http_client(&self.config.endpoints.site_root, self.config.http_timeout())?;

        let ranges = sse::split_yearly(request.start_date, request.end_date)?;
        let range_list: Vec<String> = ranges.iter().map(|r| r.to_string()).collect();
        println!(
            "\nDate range split into {} yearly periods: {}",
            ranges.len(),
            range_list.join(", ")
        );

        let announcements = self.collect_announcements(&client, request, &ranges).await?;
        let results = self
            .download_all(browser, &announcements, &request.target_dir)
            .await?;

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Ok(RunSummary {
            ranges: ranges.len(),
            announcements: announcements.len(),
            succeeded,
            failed: results.len() - succeeded,
        })
    }

    /// Fetch announcements for every range, keeping range order then page order
    pub async fn collect_announcements(
        &self,
        client: &Client,
        request: &DownloadRequest,
        ranges: &[DateRange],
    ) -> Result<Vec<Announcement>> {
        let fetcher = AnnouncementFetcher::new(client, &self.config);
        let mut all = Vec::new();

        for range in ranges {
            println!("\n--- Processing period: {} ---", range);
            let found = fetcher
                .fetch_all(&request.security_code, range, &request.title_filter)
                .await
                .with_context(|| format!("Failed to fetch announcements for {}", range))?;

            println!(
                "--- Period {} done, {} announcements ---",
                range,
                found.len()
            );
            all.extend(found);
        }

        println!("\n--- Announcement list complete, {} in total ---", all.len());
        info!(
            "Collected {} announcements for {}",
            all.len(),
            request.security_code
        );
        Ok(all)
    }

    /// Download every announcement in order with the shared browser.
    ///
    /// A failed file is recorded and the remaining files are still attempted.
    pub async fn download_all(
        &self,
        browser: &mut dyn BrowserSession,
        announcements: &[Announcement],
        target_dir: &Path,
    ) -> Result<Vec<DownloadResult>> {
        if announcements.is_empty() {
            println!("No announcements to download.");
            return Ok(Vec::new());
        }

        std::fs::create_dir_all(target_dir).with_context(|| {
            format!(
                "Cannot create output directory: {}",
                target_dir.display()
            )
        })?;
        println!("Files will be saved to: {}", storage::display_path(target_dir));

        let total = announcements.len();
        let mut results = Vec::with_capacity(total);

        for (index, announcement) in announcements.iter().enumerate() {
            println!("\n[{}/{}] Processing: {}", index + 1, total, announcement.title);
            let destination = storage::announcement_path(target_dir, &announcement.title);

            let result =
                sse::download_announcement(browser, &announcement.url, &destination, &self.config)
                    .await;

            if result.is_success() {
                info!("✓ {}", result);
            } else {
                warn!("✗ {}", result);
            }
            println!("{}", result);
            results.push(result);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::MockBrowser;
    use crate::browser::SessionCookie;
    use chrono::NaiveDate;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn request(target_dir: &Path) -> DownloadRequest {
        DownloadRequest {
            security_code: "600036".to_string(),
            start_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            title_filter: String::new(),
            target_dir: target_dir.to_path_buf(),
        }
    }

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.browser.bootstrap_settle_ms = 0;
        config.rate_limits.page_delay_ms = 0;
        config.rate_limits.retry_delay_ms = 0;
        config
    }

    #[tokio::test]
    async fn test_browser_closed_when_bootstrap_fails() {
        let temp_dir = TempDir::new().unwrap();
        let browser = MockBrowser::with_cookies(Vec::new());
        let closed = browser.closed.clone();

        let err = Orchestrator::new(fast_config())
            .run(Box::new(browser), &request(temp_dir.path()))
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("No cookies"));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_browser_closed_when_range_is_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let browser = MockBrowser::with_cookies(vec![SessionCookie::new("a", "1")]);
        let closed = browser.closed.clone();

        let mut bad_request = request(temp_dir.path());
        std::mem::swap(&mut bad_request.start_date, &mut bad_request.end_date);

        let result = Orchestrator::new(fast_config())
            .run(Box::new(browser), &bad_request)
            .await;

        assert!(result.is_err());
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_download_all_with_nothing_to_do() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("empty");
        let mut browser = MockBrowser::with_cookies(vec![SessionCookie::new("a", "1")]);

        let results = Orchestrator::new(fast_config())
            .download_all(&mut browser, &[], &target)
            .await
            .unwrap();

        assert!(results.is_empty());
        assert!(!target.exists());
        assert!(browser.visits().is_empty());
    }

    #[tokio::test]
    async fn test_failed_file_does_not_stop_the_rest() {
        let temp_dir = TempDir::new().unwrap();
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::path("/ok.pdf"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
            .mount(&server)
            .await;

        let announcements = vec![
            Announcement {
                title: "Broken".to_string(),
                url: format!("{}/broken.pdf", server.uri()),
            },
            Announcement {
                title: "Fine".to_string(),
                url: format!("{}/ok.pdf", server.uri()),
            },
        ];
        let mut browser =
            MockBrowser::with_cookies(vec![SessionCookie::new("a", "1")]).failing_on("broken");

        let results = Orchestrator::new(fast_config())
            .download_all(&mut browser, &announcements, temp_dir.path())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(!results[0].is_success());
        assert_eq!(results[0].filename, "Broken.pdf");
        assert!(results[1].is_success());
        assert_eq!(
            std::fs::read(temp_dir.path().join("Fine.pdf")).unwrap(),
            b"%PDF-1.4"
        );
    }
}
