//! SSE (Shanghai Stock Exchange) module
//!
//! This module provides functionality for working with the SSE disclosure
//! site: splitting query periods, paging through the bulletin listing API,
//! and downloading the announcement PDFs.

pub mod dates;
pub mod downloader;
pub mod errors;
pub mod fetcher;
pub mod retry;
pub mod types;

pub use errors::SseError;
pub use types::*;

// Re-export commonly used items
pub use dates::{split_yearly, DateRange};
pub use downloader::download_announcement;
pub use fetcher::AnnouncementFetcher;
pub use retry::{Backoff, RetryPolicy};
