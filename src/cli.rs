use crate::config::Config;
use crate::models::DownloadRequest;
use crate::storage;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;

/// Default lookback when no start date is given
const DEFAULT_LOOKBACK_DAYS: i64 = 3 * 365;

#[derive(Parser, Debug)]
#[command(name = "sse-ann")]
#[command(about = "Download Shanghai Stock Exchange disclosure announcements for a listed company")]
#[command(version)]
pub struct Cli {
    /// Security code to query (defaults to SSE_DEFAULT_SECURITY_CODE or 600036)
    pub security_code: Option<String>,

    /// Start date (YYYY-MM-DD), defaults to three years before today
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Output folder name under the download directory (default: <code>_<timestamp>)
    #[arg(long)]
    pub output: Option<String>,

    /// Only fetch announcements whose title contains this keyword
    #[arg(long, default_value = "")]
    pub title: String,
}

impl Cli {
    /// Resolve defaults against the configuration and the current time
    pub fn into_request(self, config: &Config, now: NaiveDateTime) -> DownloadRequest {
        let today = now.date();
        let security_code = self
            .security_code
            .unwrap_or_else(|| config.default_security_code.clone());
        let target_dir = storage::resolve_target_dir(
            &config.download_dir,
            self.output.as_deref(),
            &security_code,
            now,
        );

        DownloadRequest {
            start_date: self.start.unwrap_or_else(|| default_start_date(today)),
            end_date: self.end.unwrap_or(today),
            title_filter: self.title,
            security_code,
            target_dir,
        }
    }
}

pub fn default_start_date(today: NaiveDate) -> NaiveDate {
    today - Duration::days(DEFAULT_LOOKBACK_DAYS)
}
