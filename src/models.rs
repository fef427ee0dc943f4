use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;

/// One disclosure record returned by the bulletin listing API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub title: String,
    /// Absolute document URL on the static host
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Success,
    Failure,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DownloadStatus::Success => "success",
            DownloadStatus::Failure => "failure",
        }
    }
}

/// Outcome of downloading a single announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub status: DownloadStatus,
    pub filename: String,
    pub reason: Option<String>,
    /// Bytes written, zero on failure
    pub bytes: u64,
}

impl DownloadResult {
    pub fn success(filename: impl Into<String>, bytes: u64) -> Self {
        Self {
            status: DownloadStatus::Success,
            filename: filename.into(),
            reason: None,
            bytes,
        }
    }

    pub fn failure(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::Failure,
            filename: filename.into(),
            reason: Some(reason.into()),
            bytes: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DownloadStatus::Success
    }
}

impl fmt::Display for DownloadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            DownloadStatus::Success => {
                write!(f, "Downloaded: {} ({} bytes)", self.filename, self.bytes)
            }
            DownloadStatus::Failure => write!(
                f,
                "Download failed: {}, reason: {}",
                self.filename,
                self.reason.as_deref().unwrap_or("unknown")
            ),
        }
    }
}

/// Fully resolved parameters of one run
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub security_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Title keyword filter, empty for no filtering
    pub title_filter: String,
    pub target_dir: PathBuf,
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ranges: usize,
    pub announcements: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_result_display() {
        let ok = DownloadResult::success("report.pdf", 1024);
        assert!(ok.is_success());
        assert_eq!(ok.to_string(), "Downloaded: report.pdf (1024 bytes)");

        let failed = DownloadResult::failure("report.pdf", "HTTP 404");
        assert!(!failed.is_success());
        assert_eq!(failed.status.as_str(), "failure");
        assert_eq!(
            failed.to_string(),
            "Download failed: report.pdf, reason: HTTP 404"
        );
    }
}
