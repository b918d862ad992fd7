//! Vacancy Harvest main entry point
//!
//! This is the command-line interface for the vacancy crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vacancy_harvest::config::{load_config_with_hash, validate, Config};
use vacancy_harvest::crawl_and_store;

/// Vacancy Harvest: a polite job-listing crawler
///
/// Walks the search result pages for a query, fetches every vacancy with
/// a bounded number of concurrent requests and stores them in SQLite.
/// Repeated runs update existing rows instead of duplicating them.
#[derive(Parser, Debug)]
#[command(name = "vacancy-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite job-listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Search query, e.g. "Rust developer"
    #[arg(long)]
    text: Option<String>,

    /// Region id (1 is Moscow, 2 is Saint Petersburg)
    #[arg(long)]
    area: Option<u32>,

    /// Number of result pages to walk
    #[arg(long)]
    pages: Option<u32>,

    /// Vacancies per result page
    #[arg(long)]
    per_page: Option<u32>,

    /// Database URL (sqlite:///file.db) or path
    #[arg(long)]
    db: Option<String>,

    /// Lifetime of cached responses in minutes
    #[arg(long)]
    cache_ttl: Option<u64>,

    /// Location of the response cache
    #[arg(long)]
    cache_path: Option<String>,

    /// Disable the response cache
    #[arg(long)]
    no_cache: bool,

    /// Cookie file (JSON array or Netscape format)
    #[arg(long)]
    cookies: Option<String>,

    /// Maximum concurrent detail-page fetches
    #[arg(long)]
    concurrency: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply(&self, config: &mut Config) {
        if let Some(text) = &self.text {
            config.search.text = text.clone();
        }
        if self.area.is_some() {
            config.search.area = self.area;
        }
        if let Some(pages) = self.pages {
            config.search.pages = pages;
        }
        if let Some(per_page) = self.per_page {
            config.search.per_page = per_page;
        }
        if let Some(db) = &self.db {
            config.output.database_url = db.clone();
        }
        if let Some(ttl) = self.cache_ttl {
            config.cache.ttl_minutes = ttl;
        }
        if let Some(path) = &self.cache_path {
            config.cache.path = path.clone();
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if let Some(cookies) = &self.cookies {
            config.http.cookies_file = Some(cookies.clone());
        }
        if let Some(concurrency) = self.concurrency {
            config.crawler.concurrency = concurrency;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };
    cli.apply(&mut config);

    // Stats only needs the database location
    if cli.stats {
        return handle_stats(&config);
    }

    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vacancy_harvest=info,warn"),
            1 => EnvFilter::new("vacancy_harvest=debug,info"),
            2 => EnvFilter::new("vacancy_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Vacancy Harvest Dry Run ===\n");

    println!("Search:");
    println!("  Text: {}", config.search.text);
    match config.search.area {
        Some(area) => println!("  Area: {}", area),
        None => println!("  Area: any"),
    }
    println!("  Pages: {}", config.search.pages);
    println!("  Per page: {}", config.search.per_page);

    println!("\nCrawler:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max attempts: {}", config.crawler.max_attempts);
    println!(
        "  Backoff: {}ms base, {}ms max, {}ms jitter",
        config.crawler.backoff_base_ms, config.crawler.backoff_max_ms, config.crawler.backoff_jitter_ms
    );
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay_ms);

    println!("\nHTTP:");
    println!("  Search URL: {}", config.http.search_url);
    println!("  User agent: {}", config.http.user_agent);
    match &config.http.cookies_file {
        Some(path) => println!("  Cookies: {}", path),
        None => println!("  Cookies: none"),
    }

    println!("\nCache:");
    if config.cache.enabled {
        println!("  Path: {}", config.cache.path);
        println!("  TTL: {} min", config.cache.ttl_minutes);
    } else {
        println!("  Disabled");
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_url);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would fetch up to {} vacancies",
        config.search.pages as u64 * config.search.per_page as u64
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use vacancy_harvest::output::{load_statistics, print_statistics};
    use vacancy_harvest::storage::open_existing_storage;

    println!("Database: {}\n", config.output.database_url);

    let storage = open_existing_storage(&config.output.database_url)
        .with_context(|| format!("Failed to open database {}", config.output.database_url))?;
    let stats = load_statistics(&storage).context("Failed to read statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let summary = match crawl_and_store(config).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e).context("Crawl failed");
        }
    };

    if summary.failed > 0 {
        tracing::warn!("{} vacancies could not be fetched or parsed", summary.failed);
    }

    println!("Stored vacancies: {}", summary.stored);
    Ok(())
}
