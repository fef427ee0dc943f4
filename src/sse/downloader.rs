//! Announcement document downloading functionality

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::models::DownloadResult;
use crate::sse::SseError;
use futures::StreamExt;
use reqwest::Response;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

/// Write buffer size for streamed documents
const DOWNLOAD_CHUNK_SIZE: usize = 8192;

/// Download one announcement document to `destination`.
///
/// The shared browser first visits `url` so any per-document cookie refresh
/// runs, then a fresh HTTP client replays those cookies to stream the file.
/// Errors never escape: every failure is reported as a `Failure` result.
pub async fn download_announcement(
    browser: &mut dyn BrowserSession,
    url: &str,
    destination: &Path,
    config: &Config,
) -> DownloadResult {
    let filename = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| destination.display().to_string());

    match try_download(browser, url, destination, config).await {
        Ok(bytes) => DownloadResult::success(filename, bytes),
        Err(e) => {
            warn!("Failed to download {}: {}", url, e);
            DownloadResult::failure(filename, e.to_string())
        }
    }
}

async fn try_download(
    browser: &mut dyn BrowserSession,
    url: &str,
    destination: &Path,
    config: &Config,
) -> Result<u64, SseError> {
    let credential = browser
        .acquire_session_cookies(url, config.download_settle())
        .await?;
    debug!("Harvested {} cookies for {}", credential.cookie_count(), url);

    let client = credential.http_client(&config.endpoints.site_root, config.download_timeout())?;
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SseError::ApiError {
            status_code: status.as_u16(),
            url: url.to_string(),
        });
    }

    let partial = partial_path(destination);
    let result = async {
        let bytes = stream_to_file(response, &partial).await?;
        tokio::fs::rename(&partial, destination).await?;
        Ok::<u64, SseError>(bytes)
    }
    .await;

    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&partial).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("Could not remove partial file {}: {}", partial.display(), e);
            }
        }
    }

    result
}

/// Stream the response body into `path`, returning the number of bytes written
async fn stream_to_file(response: Response, path: &Path) -> Result<u64, SseError> {
    let file = File::create(path).await?;
    let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    writer.flush().await?;
    Ok(written)
}

/// `<destination>.part`, where the body lands until it is complete
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::MockBrowser;
    use crate::browser::SessionCookie;
    use crate::models::DownloadStatus;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> Config {
        let mut config = Config::default();
        config.browser.download_settle_ms = 0;
        config
    }

    fn session_browser() -> MockBrowser {
        MockBrowser::with_cookies(vec![SessionCookie::new("acw_tc", "token")])
    }

    #[test]
    fn test_partial_path_appends_suffix() {
        let path = partial_path(Path::new("/tmp/out/2024 v1.2 report.pdf"));
        assert_eq!(path, PathBuf::from("/tmp/out/2024 v1.2 report.pdf.part"));
    }

    #[tokio::test]
    async fn test_download_writes_exact_body() {
        let server = MockServer::start().await;
        let body: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        Mock::given(method("GET"))
            .and(path("/disclosure/report.pdf"))
            .and(header("cookie", "acw_tc=token"))
            .and(header("referer", "https://www.sse.com.cn/"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("Annual Report.pdf");
        let url = format!("{}/disclosure/report.pdf", server.uri());
        let mut browser = session_browser();

        let result = download_announcement(&mut browser, &url, &destination, &test_config()).await;

        assert_eq!(result.status, DownloadStatus::Success);
        assert_eq!(result.filename, "Annual Report.pdf");
        assert_eq!(result.bytes, body.len() as u64);
        assert_eq!(std::fs::read(&destination).unwrap(), body);
        assert!(!partial_path(&destination).exists());
        assert_eq!(browser.visits(), vec![url]);
    }

    #[tokio::test]
    async fn test_http_error_becomes_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("missing.pdf");
        let url = format!("{}/missing.pdf", server.uri());

        let result =
            download_announcement(&mut session_browser(), &url, &destination, &test_config())
                .await;

        assert_eq!(result.status, DownloadStatus::Failure);
        assert_eq!(result.filename, "missing.pdf");
        assert!(result.reason.as_deref().is_some_and(|r| r.contains("404")));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_missing_cookies_becomes_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("blocked.pdf");
        let url = format!("{}/blocked.pdf", server.uri());
        let mut browser = MockBrowser::with_cookies(Vec::new());

        let result = download_announcement(&mut browser, &url, &destination, &test_config()).await;

        assert!(!result.is_success());
        assert!(result.reason.unwrap().contains("No cookies"));
    }

    #[tokio::test]
    async fn test_navigation_error_becomes_failure() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("unreachable.pdf");
        let mut browser = session_browser().failing_on("unreachable");

        let result = download_announcement(
            &mut browser,
            "https://static.sse.com.cn/unreachable.pdf",
            &destination,
            &test_config(),
        )
        .await;

        assert!(!result.is_success());
        assert!(!result.reason.unwrap().is_empty());
    }
}
