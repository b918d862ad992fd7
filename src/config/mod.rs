//! Configuration module for Vacancy Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a configuration can also be built in code and
//! completed from command-line flags before it is validated.
//!
//! # Example
//!
//! ```no_run
//! use vacancy_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Walking {} result pages", config.search.pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, CrawlerConfig, HttpConfig, OutputConfig, SearchConfig, DEFAULT_ACCEPT,
    DEFAULT_SEARCH_URL, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, read_config};
pub use validation::validate;
