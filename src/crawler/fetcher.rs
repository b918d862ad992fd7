//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured headers and cookie jar
//! - The cache-backed transport that reports whether a response was a hit
//! - The retrying fetcher used for list and detail pages
//!
//! Every non-2xx status and every transport failure (timeout, refused
//! connection, broken body) is treated as retryable.

use crate::cache::{CachedResponse, ResponseCache};
use crate::config::HttpConfig;
use crate::crawler::pacer::CacheAwarePacer;
use crate::crawler::retry::{RetryPolicy, RetryStep};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Default timeout of a single request attempt
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A response as seen by the retry layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,

    /// Whether the response was served from the response cache
    pub from_cache: bool,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport that performs a single GET and reports cache hits
///
/// Implementations must be shareable between concurrently running fetch
/// tasks.
#[async_trait]
pub trait CachingFetcher: Send + Sync {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - Header settings
/// * `timeout` - Per-request timeout
/// * `cookies` - Optional pre-seeded cookie jar
///
/// # Example
///
/// ```no_run
/// use vacancy_harvest::config::HttpConfig;
/// use vacancy_harvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&HttpConfig::default(), Duration::from_secs(30), None).unwrap();
/// ```
pub fn build_http_client(
    config: &HttpConfig,
    timeout: Duration,
    cookies: Option<Arc<Jar>>,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Ok(accept) = HeaderValue::from_str(&config.accept) {
        headers.insert(ACCEPT, accept);
    }

    let builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    let builder = match cookies {
        Some(jar) => builder.cookie_provider(jar),
        None => builder.cookie_store(true),
    };

    builder.build()
}

/// reqwest-backed transport with an optional response cache
pub struct HttpFetcher {
    client: Client,
    cache: Option<ResponseCache>,
}

impl HttpFetcher {
    pub fn new(client: Client, cache: Option<ResponseCache>) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    fn cached(&self, url: &str, params: &[(String, String)]) -> Option<CachedResponse> {
        let cache = self.cache.as_ref()?;
        match cache.get("GET", url, params) {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!("Cache lookup failed for {}: {}", url, e);
                None
            }
        }
    }

    fn store(&self, url: &str, params: &[(String, String)], response: &CachedResponse) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put("GET", url, params, response) {
                tracing::warn!("Failed to cache response for {}: {}", url, e);
            }
        }
    }
}

#[async_trait]
impl CachingFetcher for HttpFetcher {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<FetchedPage, FetchError> {
        if let Some(hit) = self.cached(url, params) {
            tracing::trace!("Cache hit for {}", url);
            return Ok(FetchedPage {
                status: hit.status,
                body: hit.body,
                from_cache: true,
            });
        }

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| classify_transport_error(url, &e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(url, &e))?;

        let page = FetchedPage {
            status,
            body,
            from_cache: false,
        };

        if page.is_success() {
            self.store(
                url,
                params,
                &CachedResponse {
                    status,
                    body: page.body.clone(),
                },
            );
        }

        Ok(page)
    }
}

/// Maps a reqwest failure to a transport error with a readable message
fn classify_transport_error(url: &str, error: &reqwest::Error) -> FetchError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.to_string()
    };

    FetchError::Transport {
        url: url.to_string(),
        message,
    }
}

/// Performs logical page fetches with bounded retries
///
/// One logical fetch is up to `policy.max_attempts` GETs. Each attempt is
/// bounded by `timeout`. On success the pacer runs with the cache-hit
/// signal before the body is returned.
pub struct RetryingFetcher {
    transport: Arc<dyn CachingFetcher>,
    policy: RetryPolicy,
    pacer: CacheAwarePacer,
    timeout: Duration,
}

impl RetryingFetcher {
    pub fn new(transport: Arc<dyn CachingFetcher>, policy: RetryPolicy, pacer: CacheAwarePacer) -> Self {
        Self {
            transport,
            policy,
            pacer,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetches `url` with query `params`, returning the response body
    ///
    /// # Errors
    ///
    /// [`FetchError::Exhausted`] wrapping the last failure once every
    /// attempt has failed.
    pub async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<String, FetchError> {
        let mut retry = self.policy.start();

        loop {
            let attempt = retry.attempt();
            let error = match self.attempt(url, params).await {
                Ok(page) if page.is_success() => {
                    if attempt > 1 {
                        tracing::debug!(url = %url, attempt, "Fetch succeeded after retry");
                    }
                    self.pacer.pace(page.from_cache).await;
                    return Ok(page.body);
                }
                Ok(page) => FetchError::Status {
                    url: url.to_string(),
                    status: page.status,
                },
                Err(e) => e,
            };

            match retry.record_failure() {
                RetryStep::Retry { next_attempt, wait } => {
                    tracing::debug!(
                        url = %url,
                        attempt,
                        next_attempt,
                        delay_ms = wait.as_millis() as u64,
                        "Fetch failed: {}",
                        error
                    );
                    tokio::time::sleep(wait).await;
                }
                RetryStep::GiveUp { attempts } => {
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts,
                        last: Box::new(error),
                    });
                }
            }
        }
    }

    async fn attempt(&self, url: &str, params: &[(String, String)]) -> Result<FetchedPage, FetchError> {
        match tokio::time::timeout(self.timeout, self.transport.get(url, params)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Transport {
                url: url.to_string(),
                message: format!("Request timeout after {:?}", self.timeout),
            }),
        }
    }
}
