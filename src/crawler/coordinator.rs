//! Crawler coordinator - main crawl orchestration logic
//!
//! Result pages are walked strictly one after another. Within a page the
//! detail pages are fetched concurrently, never more than the configured
//! limit at once, and the page's successful records are stored in one
//! transaction after every task has finished. An empty result page ends
//! the crawl.

use crate::config::{Config, SearchConfig};
use crate::cookies::CookieStore;
use crate::crawler::fetcher::{build_http_client, HttpFetcher, RetryingFetcher};
use crate::crawler::pacer::CacheAwarePacer;
use crate::crawler::parser::{HtmlParser, PageParser};
use crate::crawler::retry::RetryPolicy;
use crate::cache::ResponseCache;
use crate::record::{DetailRecord, ListEntry};
use crate::storage::{open_storage, Storage};
use crate::HarvestError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Outcome of a crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Result pages that were fetched and processed
    pub pages: u32,

    /// Vacancies written to storage
    pub stored: usize,

    /// Detail pages dropped after a fetch or parse failure
    pub failed: usize,

    /// Set when a result page could not be fetched and the crawl stopped early
    pub list_page_failed: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator<S: Storage> {
    fetcher: Arc<RetryingFetcher>,
    parser: Arc<dyn PageParser>,
    storage: S,
    search_url: String,
    concurrency: usize,
}

impl<S: Storage> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Retrying fetcher shared by all tasks
    /// * `parser` - Page parser shared by all tasks
    /// * `storage` - Destination of the records
    /// * `search_url` - Endpoint of the result pages
    /// * `concurrency` - Maximum detail fetches in flight; zero is treated as one
    pub fn new(
        fetcher: RetryingFetcher,
        parser: Arc<dyn PageParser>,
        storage: S,
        search_url: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            parser,
            storage,
            search_url: search_url.into(),
            concurrency: concurrency.max(1),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs the page loop for one search
    ///
    /// # Errors
    ///
    /// Only storage failures are returned. Fetch and parse failures are
    /// logged and counted in the summary.
    pub async fn run(&mut self, search: &SearchConfig) -> Result<CrawlSummary, HarvestError> {
        let mut summary = CrawlSummary::default();

        for page in 0..search.pages {
            let params = list_params(search, page);
            let entries = match self.fetch_list_page(&params).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!(page, "Stopping crawl, result page unavailable: {}", e);
                    summary.list_page_failed = true;
                    break;
                }
            };

            if entries.is_empty() {
                tracing::info!(page, "Result page is empty, no more vacancies");
                break;
            }

            tracing::debug!(page, entries = entries.len(), "Fetching detail pages");
            let (records, failed) = self.fetch_details(entries).await;

            let stored = self.storage.store_page(&records)?;
            summary.pages += 1;
            summary.stored += stored;
            summary.failed += failed;

            tracing::info!(page, stored, failed, "Page stored");
        }

        Ok(summary)
    }

    async fn fetch_list_page(&self, params: &[(String, String)]) -> Result<Vec<ListEntry>, HarvestError> {
        let body = self.fetcher.fetch(&self.search_url, params).await?;
        Ok(self.parser.parse_list_page(&body)?)
    }

    /// Fetches and parses every entry, returning the records in list order
    /// and the number of entries that failed
    async fn fetch_details(&self, entries: Vec<ListEntry>) -> (Vec<DetailRecord>, usize) {
        let total = entries.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, entry) in entries.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let fetcher = Arc::clone(&self.fetcher);
            let parser = Arc::clone(&self.parser);

            tasks.spawn(async move {
                let result = fetch_detail(&semaphore, &fetcher, parser.as_ref(), &entry).await;
                if let Err(e) = &result {
                    tracing::warn!(url = %entry.url, "Dropping vacancy: {}", e);
                }
                (index, result)
            });
        }

        let mut completed = Vec::with_capacity(total);
        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(record))) => completed.push((index, record)),
                Ok((_, Err(_))) => failed += 1,
                Err(e) => {
                    tracing::warn!("Detail task did not finish: {}", e);
                    failed += 1;
                }
            }
        }

        completed.sort_by_key(|(index, _)| *index);
        (completed.into_iter().map(|(_, record)| record).collect(), failed)
    }
}

async fn fetch_detail(
    semaphore: &Arc<Semaphore>,
    fetcher: &RetryingFetcher,
    parser: &dyn PageParser,
    entry: &ListEntry,
) -> Result<DetailRecord, HarvestError> {
    let body = {
        let _permit = Arc::clone(semaphore)
            .acquire_owned()
            .await
            .map_err(|e| crate::FetchError::Transport {
                url: entry.url.clone(),
                message: e.to_string(),
            })?;
        fetcher.fetch(&entry.url, &[]).await?
    };

    Ok(parser.parse_detail_page(&body, entry)?)
}

/// Query parameters of result page `page`
///
/// `area` is left out entirely when no region is configured.
pub fn list_params(search: &SearchConfig, page: u32) -> Vec<(String, String)> {
    let mut params = vec![
        ("text".to_string(), search.text.clone()),
        ("page".to_string(), page.to_string()),
        ("items_on_page".to_string(), search.per_page.to_string()),
    ];
    if let Some(area) = search.area {
        params.push(("area".to_string(), area.to_string()));
    }
    params
}

/// Runs a complete crawl from a configuration
///
/// This is the main entry point. It will:
/// 1. Load the cookie file, if any (failure is fatal)
/// 2. Build the HTTP client and open the response cache
/// 3. Open the vacancy database, creating the schema if needed
/// 4. Walk the result pages and store every vacancy found
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed
/// * `Err(HarvestError)` - Startup or storage failure
pub async fn crawl_and_store(config: &Config) -> Result<CrawlSummary, HarvestError> {
    let jar = match &config.http.cookies_file {
        Some(path) => {
            let entries = CookieStore::load(Path::new(path))?;
            Some(Arc::new(CookieStore::build_jar(&entries)?))
        }
        None => None,
    };

    let timeout = config.crawler.request_timeout();
    let client = build_http_client(&config.http, timeout, jar)?;

    let cache = if config.cache.enabled {
        let ttl = Duration::from_secs(config.cache.ttl_minutes.saturating_mul(60));
        let cache = ResponseCache::open(Path::new(&config.cache.path), ttl)?;
        tracing::debug!(path = %config.cache.path, ttl_minutes = config.cache.ttl_minutes, "Response cache ready");
        Some(cache)
    } else {
        None
    };

    let fetcher = RetryingFetcher::new(
        Arc::new(HttpFetcher::new(client, cache)),
        RetryPolicy::from_config(&config.crawler),
        CacheAwarePacer::new(config.crawler.politeness_delay()),
    )
    .with_timeout(timeout);

    let parser = HtmlParser::new()?.with_base_url(Url::parse(&config.http.search_url)?);
    let storage = open_storage(&config.output.database_url)?;

    tracing::info!(
        text = %config.search.text,
        pages = config.search.pages,
        per_page = config.search.per_page,
        concurrency = config.crawler.concurrency,
        "Starting crawl"
    );

    let mut coordinator = Coordinator::new(
        fetcher,
        Arc::new(parser),
        storage,
        config.http.search_url.clone(),
        config.crawler.concurrency as usize,
    );
    let summary = coordinator.run(&config.search).await?;

    tracing::info!(
        pages = summary.pages,
        stored = summary.stored,
        failed = summary.failed,
        "Crawl finished"
    );

    Ok(summary)
}
