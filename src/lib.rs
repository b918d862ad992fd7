//! Vacancy Harvest: a polite job-listing crawler
//!
//! This crate walks the paginated search results of a job-listing site,
//! follows every listing to its detail page with a bounded number of
//! concurrent fetches, and stores the extracted postings in a small
//! relational schema without creating duplicates across repeated runs.

pub mod cache;
pub mod config;
pub mod cookies;
pub mod crawler;
pub mod output;
pub mod record;
pub mod storage;

use thiserror::Error;

/// Main error type for Vacancy Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cookie store error: {0}")]
    Cookie(#[from] CookieError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while loading a cookie file
#[derive(Debug, Error)]
pub enum CookieError {
    #[error("Cookies file not found: {0}")]
    NotFound(String),

    #[error("Failed to read cookies file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON cookies: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed cookie on line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Invalid cookie domain: {0}")]
    InvalidDomain(String),
}

/// Errors raised while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Giving up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },
}

/// Errors raised while turning a page body into records
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Missing field {field} on {url}")]
    MissingField { field: &'static str, url: String },
}

/// Result type alias for Vacancy Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl_and_store, CrawlSummary};
pub use record::{DetailRecord, ListEntry};
