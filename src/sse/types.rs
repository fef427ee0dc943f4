//! Shared SSE types and data structures

use crate::models::Announcement;
use serde::Deserialize;
use serde_json::Value;

/// Bulletin listing response returned by `queryCompanyBulletinNew.do`
#[derive(Debug, Deserialize, Default)]
pub struct BulletinResponse {
    /// Paging envelope; absent on some error replies
    #[serde(rename = "pageHelp", default)]
    pub page_help: Option<PageHelp>,
}

/// Paging envelope carrying the bulletin rows
#[derive(Debug, Deserialize, Default)]
pub struct PageHelp {
    /// Bulletins grouped in nested lists
    #[serde(default)]
    pub data: Option<Vec<Vec<BulletinItem>>>,
}

/// A single bulletin row.
///
/// Decoded from any JSON value so that one odd row cannot fail the whole
/// page: non-string `TITLE`/`URL` fields and non-object rows come out as
/// `None`.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(from = "Value")]
pub struct BulletinItem {
    /// Announcement title
    pub title: Option<String>,

    /// Document path relative to the static host
    pub url: Option<String>,
}

impl From<Value> for BulletinItem {
    fn from(value: Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            title: text("TITLE"),
            url: text("URL"),
        }
    }
}

impl BulletinResponse {
    /// Nested data payload; empty once paging has run past the last page
    pub fn into_rows(self) -> Vec<Vec<BulletinItem>> {
        self.page_help
            .and_then(|help| help.data)
            .unwrap_or_default()
    }
}

impl BulletinItem {
    /// Build an announcement when both title and URL are present and non-empty
    pub fn to_announcement(&self, static_base_url: &str) -> Option<Announcement> {
        let title = self.title.as_deref().filter(|t| !t.is_empty())?;
        let path = self.url.as_deref().filter(|u| !u.is_empty())?;

        Some(Announcement {
            title: title.to_string(),
            url: format!("{}{}", static_base_url, path),
        })
    }
}

/// SSE endpoints and request constants
pub struct SseApi;

impl SseApi {
    /// Bulletin listing endpoint
    pub const QUERY_URL: &'static str =
        "https://query.sse.com.cn/security/stock/queryCompanyBulletinNew.do";
    /// Static host serving the announcement PDFs
    pub const STATIC_BASE_URL: &'static str = "https://static.sse.com.cn";
    /// Site root, sent as the Referer
    pub const SITE_ROOT: &'static str = "https://www.sse.com.cn/";
    /// Page visited by the browser to obtain the initial session cookies
    pub const ANNOUNCEMENT_PAGE: &'static str =
        "https://www.sse.com.cn/disclosure/listedinfo/announcement/";
    /// Desktop user agent shared by the browser and the HTTP clients
    pub const DESKTOP_USER_AGENT: &'static str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
    /// Date format expected by `START_DATE` and `END_DATE`
    pub const DATE_FORMAT: &'static str = "%Y-%m-%d";
}
