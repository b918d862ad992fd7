//! Crawler module for vacancy fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a response cache, retries and politeness pacing
//! - HTML parsing of result and vacancy pages
//! - Bounded fan-out of detail fetches per result page
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod pacer;
mod parser;
mod retry;

pub use coordinator::{crawl_and_store, list_params, Coordinator, CrawlSummary};
pub use fetcher::{
    build_http_client, CachingFetcher, FetchedPage, HttpFetcher, RetryingFetcher,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use pacer::{CacheAwarePacer, DEFAULT_POLITENESS_DELAY};
pub use parser::{
    parse_published_at, parse_salary, vacancy_id_from_url, HtmlParser, PageParser,
};
pub use retry::{RetryPolicy, RetryState, RetryStep};
