//! Browser abstraction for acquiring anti-bot session cookies.
//!
//! The SSE sites hand out the cookies required by their JSON and static hosts
//! only after client-side scripts have run. A [`BrowserSession`] drives a real
//! browser to a page, then hands the resulting cookies to plain HTTP clients.

pub mod chromium;

use crate::config::Config;
use crate::sse::SseError;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub use chromium::ChromiumBrowser;

/// A cookie harvested from the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Cookies and user agent that let plain HTTP requests pass as the browser
#[derive(Debug, Clone)]
pub struct SessionCredential {
    cookies: Vec<SessionCookie>,
    user_agent: String,
}

impl SessionCredential {
    pub fn new(cookies: Vec<SessionCookie>, user_agent: impl Into<String>) -> Self {
        Self {
            cookies,
            user_agent: user_agent.into(),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn cookie_count(&self) -> usize {
        self.cookies.len()
    }

    /// `Cookie` header value carrying every harvested cookie
    pub fn cookie_header(&self) -> String {
        join_cookies(&self.cookies)
    }

    /// Build a fresh HTTP client that sends these cookies, the browser's user
    /// agent and `referer` with every request.
    ///
    /// The cookies go to every host, redirect targets included, and cookies
    /// set by responses are kept for later requests on the same client.
    pub fn http_client(&self, referer: &str, timeout: Duration) -> Result<Client, SseError> {
        HeaderValue::from_str(&self.cookie_header())
            .map_err(|e| SseError::Browser(format!("cookie is not a valid header: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            REFERER,
            HeaderValue::from_str(referer)
                .map_err(|e| SseError::Config(format!("invalid referer '{}': {}", referer, e)))?,
        );

        let store = SessionCookieStore {
            session: self.cookies.clone(),
            jar: Jar::default(),
        };

        let client = Client::builder()
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .cookie_provider(Arc::new(store))
            .timeout(timeout)
            .build()?;

        Ok(client)
    }
}

fn join_cookies(cookies: &[SessionCookie]) -> String {
    cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Browser cookies sent to any URL, overlaid with cookies the servers set
/// during the client's lifetime
struct SessionCookieStore {
    session: Vec<SessionCookie>,
    jar: Jar,
}

impl CookieStore for SessionCookieStore {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.jar.set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let mut cookies = self.session.clone();

        let fresh = self.jar.cookies(url);
        let fresh_pairs = fresh.as_ref().and_then(|v| v.to_str().ok()).unwrap_or("");
        for pair in fresh_pairs.split("; ") {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            match cookies.iter_mut().find(|c| c.name == name) {
                Some(existing) => existing.value = value.to_string(),
                None => cookies.push(SessionCookie::new(name, value)),
            }
        }

        if cookies.is_empty() {
            return None;
        }
        HeaderValue::from_str(&join_cookies(&cookies)).ok()
    }
}

/// A single controllable browser context (tab)
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate the context to `url` and wait for the load to finish
    async fn navigate(&mut self, url: &str) -> Result<()>;
    /// Cookies visible to the current page
    async fn cookies(&self) -> Result<Vec<SessionCookie>>;
    /// User agent the browser presents
    fn user_agent(&self) -> &str;
    /// Shut the browser down
    async fn close(self: Box<Self>) -> Result<()>;

    /// Visit `url`, give client-side challenges `settle` to finish, then
    /// collect the cookies. An empty cookie set means the visit was blocked.
    async fn acquire_session_cookies(
        &mut self,
        url: &str,
        settle: Duration,
    ) -> Result<SessionCredential, SseError> {
        self.navigate(url).await?;

        if !settle.is_zero() {
            debug!("Waiting {:?} for {} to settle", settle, url);
            tokio::time::sleep(settle).await;
        }

        let cookies = self.cookies().await?;
        if cookies.is_empty() {
            return Err(SseError::NoCookies {
                url: url.to_string(),
            });
        }

        Ok(SessionCredential::new(cookies, self.user_agent()))
    }
}

/// Obtain the initial session from the announcement page.
///
/// Leaves the browser on that page so the same context can be reused for
/// document downloads.
pub async fn bootstrap(
    browser: &mut dyn BrowserSession,
    config: &Config,
) -> Result<SessionCredential, SseError> {
    let url = &config.endpoints.announcement_page;
    info!("Visiting {} to obtain the initial session", url);

    let credential = browser
        .acquire_session_cookies(url, config.bootstrap_settle())
        .await?;

    info!("Obtained {} initial cookies", credential.cookie_count());
    Ok(credential)
}
