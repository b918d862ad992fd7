//! Records produced by the page parser
//!
//! These are plain value types handed from the parser to the orchestrator
//! and on to storage. Fields a page may omit are explicit `Option`s.

use chrono::{DateTime, Utc};

/// Minimal posting data taken from one card of a search-results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Stable business key of the posting (digits after `/vacancy/`)
    pub vacancy_id: i64,

    /// Posting title as shown on the card
    pub name: String,

    /// Absolute detail-page URL without query string
    pub url: String,

    /// Employer display name
    pub employer_name: Option<String>,

    /// Region / address display name
    pub area_name: Option<String>,

    /// Raw publication-date text
    pub published_at_text: Option<String>,
}

/// Full posting data taken from a detail page
///
/// Fields missing on the detail page are filled from the [`ListEntry`]
/// the page was reached from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRecord {
    pub vacancy_id: i64,
    pub name: String,
    pub url: String,
    pub employer_name: Option<String>,
    pub area_name: Option<String>,
    pub published_at: DateTime<Utc>,
    pub salary_from: Option<i64>,
    pub salary_to: Option<i64>,
    pub salary_currency: Option<String>,
    pub schedule: Option<String>,
    pub employment: Option<String>,
    pub experience: Option<String>,
    pub skills: Vec<String>,
}

impl DetailRecord {
    /// Builds a record carrying only what the list entry knows
    pub fn from_entry(entry: &ListEntry, published_at: DateTime<Utc>) -> Self {
        Self {
            vacancy_id: entry.vacancy_id,
            name: entry.name.clone(),
            url: entry.url.clone(),
            employer_name: entry.employer_name.clone(),
            area_name: entry.area_name.clone(),
            published_at,
            salary_from: None,
            salary_to: None,
            salary_currency: None,
            schedule: None,
            employment: None,
            experience: None,
            skills: Vec::new(),
        }
    }
}
