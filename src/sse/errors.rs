//! SSE-specific error types

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SseError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("No cookies could be obtained from the browser at {url}; the request is probably being blocked")]
    NoCookies { url: String },

    #[error("Failed to parse bulletin response for page {page}: {source}")]
    MalformedResponse {
        page: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("SSE request failed (status {status_code}): {url}")]
    ApiError { status_code: u16, url: String },

    #[error("Gave up on page {page} after {attempts} attempts: {message}")]
    RetriesExhausted {
        page: u32,
        attempts: u32,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<anyhow::Error> for SseError {
    fn from(err: anyhow::Error) -> Self {
        SseError::Browser(format!("{:#}", err))
    }
}
