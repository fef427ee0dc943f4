//! Paginated retrieval of bulletin listings

use crate::config::Config;
use crate::models::Announcement;
use crate::sse::{BulletinResponse, DateRange, RetryPolicy, SseError};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pages through the bulletin listing API for one security code
pub struct AnnouncementFetcher<'a> {
    client: &'a Client,
    query_url: String,
    static_base_url: String,
    page_size: u32,
    page_delay: Duration,
    retry: RetryPolicy,
}

impl<'a> AnnouncementFetcher<'a> {
    pub fn new(client: &'a Client, config: &Config) -> Self {
        Self {
            client,
            query_url: config.endpoints.query_url.clone(),
            static_base_url: config.endpoints.static_base_url.clone(),
            page_size: config.page_size,
            page_delay: config.page_delay(),
            retry: config.retry_policy(),
        }
    }

    /// Replace the retry policy taken from the configuration
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch every announcement in `range`, page by page, until a page comes
    /// back without data.
    ///
    /// Unparseable pages are skipped. Failed requests are retried on the same
    /// page according to the retry policy.
    pub async fn fetch_all(
        &self,
        security_code: &str,
        range: &DateRange,
        title_filter: &str,
    ) -> Result<Vec<Announcement>, SseError> {
        let mut announcements = Vec::new();
        let mut page: u32 = 1;
        let mut failures: u32 = 0;

        loop {
            let body = match self.fetch_page(security_code, range, title_filter, page).await {
                Ok(body) => {
                    failures = 0;
                    body
                }
                Err(e) => {
                    failures += 1;
                    match self.retry.next_delay(failures) {
                        Some(delay) => {
                            warn!(
                                "Request for page {} failed: {}. Retrying in {:?}",
                                page, e, delay
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        None => {
                            return Err(SseError::RetriesExhausted {
                                page,
                                attempts: failures,
                                message: e.to_string(),
                            });
                        }
                    }
                }
            };

            let response: BulletinResponse = match serde_json::from_str(&body) {
                Ok(response) => response,
                Err(source) => {
                    warn!("{}. Skipping page", SseError::MalformedResponse { page, source });
                    page += 1;
                    continue;
                }
            };

            let rows = response.into_rows();
            if rows.is_empty() {
                debug!("Page {} has no data, reached the end of {}", page, range);
                break;
            }

            let before = announcements.len();
            announcements.extend(
                rows.iter()
                    .flatten()
                    .filter_map(|item| item.to_announcement(&self.static_base_url)),
            );
            debug!(
                "Page {} yielded {} announcements",
                page,
                announcements.len() - before
            );

            page += 1;
            tokio::time::sleep(self.page_delay).await;
        }

        info!(
            "Fetched {} announcements for {} between {}",
            announcements.len(),
            security_code,
            range
        );
        Ok(announcements)
    }

    async fn fetch_page(
        &self,
        security_code: &str,
        range: &DateRange,
        title_filter: &str,
        page: u32,
    ) -> Result<String, SseError> {
        let page_size = self.page_size.to_string();
        let page_no = page.to_string();
        let start_date = range.start_str();
        let end_date = range.end_str();

        debug!("Fetching bulletin page {} for {} ({})", page, security_code, range);

        let response = self
            .client
            .get(&self.query_url)
            .query(&[
                ("isPagination", "true"),
                ("pageHelp.pageSize", page_size.as_str()),
                ("pageHelp.cacheSize", "1"),
                ("START_DATE", start_date.as_str()),
                ("END_DATE", end_date.as_str()),
                ("SECURITY_CODE", security_code),
                ("pageHelp.beginPage", page_no.as_str()),
                ("pageHelp.pageNo", page_no.as_str()),
                ("TITLE", title_filter),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SseError::ApiError {
                status_code: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
