//! Centralized configuration management for sse-announcements

use crate::sse::{Backoff, RetryPolicy, SseApi};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for downloaded announcements
    pub download_dir: PathBuf,
    /// Security code used when none is given on the command line
    pub default_security_code: String,
    /// Rows requested per listing page
    pub page_size: u32,
    /// Remote endpoints
    pub endpoints: Endpoints,
    /// Rate limiting and retry configuration
    pub rate_limits: RateLimits,
    /// Headless browser configuration
    pub browser: BrowserConfig,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// Remote endpoints, overridable for testing
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Bulletin listing API
    pub query_url: String,
    /// Prefix joined with the document paths returned by the listing API
    pub static_base_url: String,
    /// Referer sent with every request
    pub site_root: String,
    /// Page visited to bootstrap the session cookies
    pub announcement_page: String,
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimits {
    /// Delay between successful listing pages (milliseconds)
    pub page_delay_ms: u64,
    /// Delay before retrying a failed listing request (milliseconds)
    pub retry_delay_ms: u64,
    /// Maximum attempts per listing page, unlimited when unset
    pub retry_max_attempts: Option<u32>,
    /// Enables exponential backoff capped at this delay (milliseconds)
    pub retry_max_delay_ms: Option<u64>,
}

/// Headless browser configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Wait after loading the announcement page before reading cookies (milliseconds)
    pub bootstrap_settle_ms: u64,
    /// Wait after navigating to a document before reading cookies (milliseconds)
    pub download_settle_ms: u64,
    /// Navigation timeout in seconds
    pub navigation_timeout_seconds: u64,
    /// Explicit Chromium binary, discovered on PATH when unset
    pub chromium_path: Option<PathBuf>,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Listing request timeout in seconds
    pub timeout_seconds: u64,
    /// Document download timeout in seconds
    pub download_timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            query_url: SseApi::QUERY_URL.to_string(),
            static_base_url: SseApi::STATIC_BASE_URL.to_string(),
            site_root: SseApi::SITE_ROOT.to_string(),
            announcement_page: SseApi::ANNOUNCEMENT_PAGE.to_string(),
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            page_delay_ms: 500,
            retry_delay_ms: 2000,
            retry_max_attempts: None,
            retry_max_delay_ms: None,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            bootstrap_settle_ms: 5000,
            download_settle_ms: 0,
            navigation_timeout_seconds: 30,
            chromium_path: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            download_timeout_seconds: 60,
            user_agent: SseApi::DESKTOP_USER_AGENT.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            default_security_code: "600036".to_string(),
            page_size: 100,
            endpoints: Endpoints::default(),
            rate_limits: RateLimits::default(),
            browser: BrowserConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let download_dir = std::env::var("SSE_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.download_dir);

        let default_security_code = std::env::var("SSE_DEFAULT_SECURITY_CODE")
            .unwrap_or(defaults.default_security_code);

        let rate_limits = RateLimits {
            page_delay_ms: parse_env_var("SSE_PAGE_DELAY_MS")?
                .unwrap_or(defaults.rate_limits.page_delay_ms),
            retry_delay_ms: parse_env_var("SSE_RETRY_DELAY_MS")?
                .unwrap_or(defaults.rate_limits.retry_delay_ms),
            retry_max_attempts: parse_env_var("SSE_RETRY_MAX_ATTEMPTS")?,
            retry_max_delay_ms: parse_env_var("SSE_RETRY_MAX_DELAY_MS")?,
        };

        let browser = BrowserConfig {
            bootstrap_settle_ms: parse_env_var("SSE_BOOTSTRAP_SETTLE_MS")?
                .unwrap_or(defaults.browser.bootstrap_settle_ms),
            download_settle_ms: parse_env_var("SSE_DOWNLOAD_SETTLE_MS")?
                .unwrap_or(defaults.browser.download_settle_ms),
            navigation_timeout_seconds: parse_env_var("SSE_NAVIGATION_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.browser.navigation_timeout_seconds),
            chromium_path: std::env::var("SSE_CHROMIUM_PATH").ok().map(PathBuf::from),
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("SSE_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.timeout_seconds),
            download_timeout_seconds: parse_env_var("SSE_DOWNLOAD_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.download_timeout_seconds),
            user_agent: std::env::var("SSE_USER_AGENT").unwrap_or(defaults.http.user_agent),
        };

        Ok(Config {
            download_dir,
            default_security_code,
            page_size: parse_env_var("SSE_PAGE_SIZE")?.unwrap_or(defaults.page_size),
            endpoints: defaults.endpoints,
            rate_limits,
            browser,
            http,
        })
    }

    /// Delay between successful listing pages
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limits.page_delay_ms)
    }

    /// Retry policy for listing requests
    pub fn retry_policy(&self) -> RetryPolicy {
        let initial = Duration::from_millis(self.rate_limits.retry_delay_ms);
        let backoff = match self.rate_limits.retry_max_delay_ms {
            Some(max_ms) => Backoff::Exponential {
                initial,
                max: Duration::from_millis(max_ms),
            },
            None => Backoff::Fixed(initial),
        };

        match self.rate_limits.retry_max_attempts {
            Some(max_attempts) => RetryPolicy::bounded(max_attempts, backoff),
            None => RetryPolicy {
                max_attempts: None,
                backoff,
            },
        }
    }

    pub fn bootstrap_settle(&self) -> Duration {
        Duration::from_millis(self.browser.bootstrap_settle_ms)
    }

    pub fn download_settle(&self) -> Duration {
        Duration::from_millis(self.browser.download_settle_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.browser.navigation_timeout_seconds)
    }

    /// Get listing HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Get document download timeout as Duration
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.http.download_timeout_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(anyhow::anyhow!("Page size must be greater than zero"));
        }

        for (name, value) in [
            ("query URL", &self.endpoints.query_url),
            ("static base URL", &self.endpoints.static_base_url),
            ("site root", &self.endpoints.site_root),
            ("announcement page", &self.endpoints.announcement_page),
        ] {
            url::Url::parse(value).with_context(|| format!("Invalid {}: {}", name, value))?;
        }

        if let Some(path) = &self.browser.chromium_path {
            if !path.exists() {
                return Err(anyhow::anyhow!(
                    "Chromium binary does not exist: {}",
                    path.display()
                ));
            }
        }

        // Check if download directory can be created
        std::fs::create_dir_all(&self.download_dir).with_context(|| {
            format!(
                "Cannot create download directory: {}",
                self.download_dir.display()
            )
        })?;

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
