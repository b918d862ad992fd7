//! Cookie file loading
//!
//! Authenticated crawls are seeded from a cookie file exported from a
//! browser. Two layouts are accepted:
//! - a JSON array of cookie objects (`[{"name": ..., "value": ...}, ...]`)
//! - a Netscape `cookies.txt` file
//!
//! The layout is chosen from the first non-whitespace character: `[` means
//! JSON, anything else is read as Netscape.

mod parser;

use crate::CookieError;
use reqwest::cookie::Jar;
use std::path::Path;
use url::Url;

pub use parser::{parse_json_cookies, parse_netscape_cookies};

/// Domain assumed for cookies that do not name one
pub const DEFAULT_COOKIE_DOMAIN: &str = ".hh.ru";

/// A single cookie read from a cookie file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieEntry {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
}

impl CookieEntry {
    /// Renders the cookie as a `Set-Cookie` header value
    pub fn to_set_cookie(&self) -> String {
        let mut header = format!(
            "{}={}; Domain={}; Path={}",
            self.name,
            self.value,
            self.domain.trim_start_matches('.'),
            self.path
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }

    /// URL the cookie is registered against when seeding a jar
    fn origin_url(&self) -> Result<Url, CookieError> {
        let host = self.domain.trim_start_matches('.');
        Url::parse(&format!("https://{}{}", host, self.path))
            .map_err(|e| CookieError::InvalidDomain(format!("{}: {}", self.domain, e)))
    }
}

/// Loader for cookie files
pub struct CookieStore;

impl CookieStore {
    /// Loads every cookie from `path`
    ///
    /// # Errors
    ///
    /// A missing file, unreadable content, invalid JSON or a malformed
    /// Netscape line are all reported as [`CookieError`]; the caller treats
    /// them as fatal before any crawling starts.
    pub fn load(path: &Path) -> Result<Vec<CookieEntry>, CookieError> {
        if !path.exists() {
            return Err(CookieError::NotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let text = text.trim_start();

        let entries = if text.starts_with('[') {
            let entries = parse_json_cookies(text)?;
            tracing::info!("Loaded {} cookies in JSON format: {}", entries.len(), path.display());
            entries
        } else {
            let entries = parse_netscape_cookies(text)?;
            tracing::info!(
                "Loaded {} cookies in Netscape format: {}",
                entries.len(),
                path.display()
            );
            entries
        };

        Ok(entries)
    }

    /// Builds a cookie jar for the HTTP client from loaded entries
    pub fn build_jar(entries: &[CookieEntry]) -> Result<Jar, CookieError> {
        let jar = Jar::default();
        for entry in entries {
            let url = entry.origin_url()?;
            jar.add_cookie_str(&entry.to_set_cookie(), &url);
        }
        Ok(jar)
    }
}

/// Adds a leading dot to bare multi-label domains (`hh.ru` -> `.hh.ru`)
pub(crate) fn normalize_domain(domain: &str) -> String {
    if !domain.starts_with('.') && domain.contains('.') {
        format!(".{}", domain)
    } else {
        domain.to_string()
    }
}
