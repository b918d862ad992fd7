//! Parsers for the two supported cookie file layouts

use crate::cookies::{normalize_domain, CookieEntry, DEFAULT_COOKIE_DOMAIN};
use crate::CookieError;
use serde::Deserialize;

/// One object of a browser-exported JSON cookie array
///
/// Exporters add many more keys (expiry, sameSite, ...); they are ignored.
#[derive(Debug, Deserialize)]
struct JsonCookie {
    name: Option<String>,
    #[serde(default)]
    value: String,
    domain: Option<String>,
    path: Option<String>,
    #[serde(default)]
    secure: bool,
}

/// Parses a JSON array of cookie objects
pub fn parse_json_cookies(text: &str) -> Result<Vec<CookieEntry>, CookieError> {
    let raw: Vec<JsonCookie> = serde_json::from_str(text)?;

    raw.into_iter()
        .enumerate()
        .map(|(index, cookie)| {
            let name = cookie.name.filter(|n| !n.is_empty()).ok_or_else(|| {
                CookieError::Malformed {
                    line: index + 1,
                    reason: "cookie object has no name".to_string(),
                }
            })?;
            let domain = cookie
                .domain
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| DEFAULT_COOKIE_DOMAIN.to_string());

            Ok(CookieEntry {
                name,
                value: cookie.value,
                domain: normalize_domain(&domain),
                path: cookie.path.filter(|p| !p.is_empty()).unwrap_or_else(|| "/".to_string()),
                secure: cookie.secure,
            })
        })
        .collect()
}

/// Parses a Netscape `cookies.txt` file
///
/// Each data line holds seven tab-separated fields: domain, subdomain flag,
/// path, secure flag, expiry, name, value. Expiry is ignored so that
/// session cookies exported by a browser stay usable.
pub fn parse_netscape_cookies(text: &str) -> Result<Vec<CookieEntry>, CookieError> {
    let mut entries = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim_end_matches(['\r', '\n']);

        // curl/browser exports mark HttpOnly cookies with this prefix
        let line = match line.strip_prefix("#HttpOnly_") {
            Some(rest) => rest,
            None if line.trim().is_empty() || line.starts_with('#') => continue,
            None => line,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 6 {
            return Err(CookieError::Malformed {
                line: line_no,
                reason: format!("expected 7 tab-separated fields, got {}", fields.len()),
            });
        }

        let name = fields[5].trim();
        if name.is_empty() {
            return Err(CookieError::Malformed {
                line: line_no,
                reason: "empty cookie name".to_string(),
            });
        }

        let domain = match fields[0].trim() {
            "" => DEFAULT_COOKIE_DOMAIN.to_string(),
            d => normalize_domain(d),
        };
        let path = match fields[2].trim() {
            "" => "/".to_string(),
            p => p.to_string(),
        };

        entries.push(CookieEntry {
            name: name.to_string(),
            value: fields.get(6).map(|v| v.trim().to_string()).unwrap_or_default(),
            domain,
            path,
            secure: fields[3].trim().eq_ignore_ascii_case("TRUE"),
        });
    }

    Ok(entries)
}
