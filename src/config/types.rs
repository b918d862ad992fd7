use serde::Deserialize;
use std::time::Duration;

/// Search endpoint used when the configuration does not name one
pub const DEFAULT_SEARCH_URL: &str = "https://hh.ru/search/vacancy";

/// Default request headers
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; HHParserBot/1.0; +https://example.com/bot)";
pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Main configuration structure for Vacancy Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub output: OutputConfig,
}

/// What to search for and how many result pages to walk
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search query text
    pub text: String,

    /// Optional region id
    pub area: Option<u32>,

    /// Number of result pages to walk
    pub pages: u32,

    /// Results per page
    #[serde(rename = "per-page")]
    pub per_page: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            area: None,
            pages: 1,
            per_page: 50,
        }
    }
}

/// Fan-out, retry and pacing behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of detail fetches in flight
    pub concurrency: u32,

    /// Timeout for a single request attempt (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Total attempts per logical fetch, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// First backoff wait (milliseconds)
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Upper bound for any single backoff wait (milliseconds)
    #[serde(rename = "backoff-max-ms")]
    pub backoff_max_ms: u64,

    /// Upper bound of the random jitter added to each wait (milliseconds)
    #[serde(rename = "backoff-jitter-ms")]
    pub backoff_jitter_ms: u64,

    /// Delay after a response that did not come from cache (milliseconds)
    #[serde(rename = "politeness-delay-ms")]
    pub politeness_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            request_timeout_secs: 30,
            max_attempts: 5,
            backoff_base_ms: 500,
            backoff_max_ms: 4000,
            backoff_jitter_ms: 1000,
            politeness_delay_ms: 400,
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

/// Transport settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Search-results endpoint
    #[serde(rename = "search-url")]
    pub search_url: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    pub accept: String,

    /// Optional JSON or Netscape cookie file used to authenticate requests
    #[serde(rename = "cookies-file")]
    pub cookies_file: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            cookies_file: None,
        }
    }
}

/// HTTP response cache settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Path to the SQLite cache file
    pub path: String,

    /// Lifetime of a cached response (minutes)
    #[serde(rename = "ttl-minutes")]
    pub ttl_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: ".cache/http_cache.sqlite3".to_string(),
            ttl_minutes: 60,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// `sqlite://` URL or plain path of the vacancy database
    #[serde(rename = "database-url")]
    pub database_url: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:///hh_bs.sqlite3".to_string(),
        }
    }
}
