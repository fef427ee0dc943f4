use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use sse_announcements::browser::{BrowserSession, SessionCookie};
use sse_announcements::config::Config;
use sse_announcements::downloader::Orchestrator;
use sse_announcements::models::{DownloadRequest, RunSummary};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Browser stand-in that always reports the same session cookie
struct FixedCookieBrowser {
    visited: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl BrowserSession for FixedCookieBrowser {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        Ok(vec![SessionCookie::new("acw_tc", "session")])
    }

    fn user_agent(&self) -> &str {
        "integration-test"
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

async fn mount_listing(server: &MockServer, start: &str, page: &str, data: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(header("cookie", "acw_tc=session"))
        .and(query_param("START_DATE", start))
        .and(query_param("pageHelp.pageNo", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pageHelp": { "data": data } })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_across_two_years() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "2023-06-01",
        "1",
        json!([[{"TITLE": "2023 Interim Report", "URL": "/docs/interim.pdf"}]]),
    )
    .await;
    mount_listing(&server, "2023-06-01", "2", json!([])).await;
    mount_listing(
        &server,
        "2024-01-01",
        "1",
        json!([[
            {"TITLE": "Board Resolution: Dividend", "URL": "/docs/dividend.pdf"},
            {"TITLE": "Missing link", "URL": ""}
        ]]),
    )
    .await;
    mount_listing(&server, "2024-01-01", "2", json!([])).await;

    Mock::given(method("GET"))
        .and(path("/docs/interim.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF interim".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/dividend.pdf"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.download_dir = temp_dir.path().to_path_buf();
    config.endpoints.query_url = format!("{}/query", server.uri());
    config.endpoints.static_base_url = server.uri();
    config.endpoints.announcement_page = format!("{}/announcement/", server.uri());
    config.browser.bootstrap_settle_ms = 0;
    config.rate_limits.page_delay_ms = 0;
    config.rate_limits.retry_delay_ms = 0;

    let request = DownloadRequest {
        security_code: "600036".to_string(),
        start_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        title_filter: String::new(),
        target_dir: temp_dir.path().join("600036_run"),
    };

    let visited = Arc::new(Mutex::new(Vec::new()));
    let closed = Arc::new(AtomicBool::new(false));
    let browser = FixedCookieBrowser {
        visited: visited.clone(),
        closed: closed.clone(),
    };

    let summary = Orchestrator::new(config)
        .run(Box::new(browser), &request)
        .await
        .unwrap();

    assert_eq!(
        summary,
        RunSummary {
            ranges: 2,
            announcements: 2,
            succeeded: 1,
            failed: 1,
        }
    );
    assert!(closed.load(Ordering::SeqCst));

    let visited = visited.lock().unwrap().clone();
    assert_eq!(
        visited,
        vec![
            format!("{}/announcement/", server.uri()),
            format!("{}/docs/interim.pdf", server.uri()),
            format!("{}/docs/dividend.pdf", server.uri()),
        ]
    );

    let saved = request.target_dir.join("2023 Interim Report.pdf");
    assert_eq!(std::fs::read(saved).unwrap(), b"%PDF interim");
    assert!(!request.target_dir.join("Board Resolution Dividend.pdf").exists());
    assert!(!request
        .target_dir
        .join("Board Resolution Dividend.pdf.part")
        .exists());
}
