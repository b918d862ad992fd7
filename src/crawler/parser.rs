//! HTML parser for search-results and vacancy pages
//!
//! This module turns fetched page bodies into records:
//! - search-results cards into [`ListEntry`] values
//! - a vacancy page into a [`DetailRecord`], falling back to the list entry
//!   for anything the page does not show
//! - salary and publication-date texts into typed values
//!
//! Several selectors are tried for each field so that small markup changes
//! on the site do not break extraction.

use crate::record::{DetailRecord, ListEntry};
use crate::ParseError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static VACANCY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/vacancy/(\d+)").expect("valid vacancy id regex"));

static SALARY_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d[\d\s\u{00A0}\u{202F}]*").expect("valid salary number regex")
});

static FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bот\b").expect("valid salary lower-bound regex"));

static TO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bдо\b").expect("valid salary upper-bound regex"));

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\s+([а-яё]+)(?:\s+(\d{4}))?").expect("valid publication date regex")
});

/// Turns fetched page bodies into typed records
///
/// Implementations are shared by all concurrent detail tasks.
pub trait PageParser: Send + Sync {
    /// Extracts every vacancy card from a search-results page
    ///
    /// An empty vector means the result pages are exhausted.
    fn parse_list_page(&self, body: &str) -> Result<Vec<ListEntry>, ParseError>;

    /// Extracts a full record from a vacancy page
    ///
    /// Fields missing from the page are taken from `fallback`.
    fn parse_detail_page(&self, body: &str, fallback: &ListEntry) -> Result<DetailRecord, ParseError>;
}

struct Selectors {
    card: Selector,
    card_title: Selector,
    card_employer: Selector,
    card_address: Selector,
    card_date: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    salary: Selector,
    experience: Selector,
    employment: Selector,
    schedule: Selector,
    skill: Selector,
    creation_time: Selector,
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector(format!("{}: {:?}", css, e)))
}

impl Selectors {
    fn new() -> Result<Self, ParseError> {
        Ok(Self {
            card: selector(
                r#"div.serp-item, div.vacancy-serp-item, div[data-qa="vacancy-serp__vacancy"]"#,
            )?,
            card_title: selector(r#"a[data-qa="serp-item__title"]"#)?,
            card_employer: selector(r#"[data-qa="vacancy-serp__vacancy-employer"]"#)?,
            card_address: selector(r#"[data-qa="vacancy-serp__vacancy-address"]"#)?,
            card_date: selector(r#"[data-qa="vacancy-serp__vacancy-date"]"#)?,
            title: selector(r#"h1[data-qa="vacancy-title"]"#)?,
            company: selector(r#"[data-qa="vacancy-company-name"]"#)?,
            location: selector(r#"[data-qa="vacancy-view-location"]"#)?,
            salary: selector(r#"[data-qa="vacancy-salary"], [data-qa="vacancy-view-salary"]"#)?,
            experience: selector(r#"[data-qa="vacancy-experience"]"#)?,
            employment: selector(r#"[data-qa="vacancy-view-employment-mode"]"#)?,
            schedule: selector(r#"[data-qa="vacancy-schedule"]"#)?,
            skill: selector(r#"[data-qa="skills-element"]"#)?,
            creation_time: selector(r#"[data-qa="vacancy-view-creation-time"]"#)?,
        })
    }
}

/// Parser for the job site's HTML markup
pub struct HtmlParser {
    selectors: Selectors,
    base_url: Option<Url>,
}

impl HtmlParser {
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            selectors: Selectors::new()?,
            base_url: None,
        })
    }

    /// Resolves relative card links against `base_url`
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    fn resolve_card_url(&self, href: &str) -> Option<Url> {
        let href = href.trim();
        let mut url = match Url::parse(href) {
            Ok(url) => url,
            Err(_) => self.base_url.as_ref()?.join(href).ok()?,
        };
        url.set_query(None);
        url.set_fragment(None);
        Some(url)
    }
}

impl PageParser for HtmlParser {
    fn parse_list_page(&self, body: &str) -> Result<Vec<ListEntry>, ParseError> {
        let document = Html::parse_document(body);
        let mut entries = Vec::new();

        for card in document.select(&self.selectors.card) {
            let Some(title) = card.select(&self.selectors.card_title).next() else {
                continue;
            };
            let Some(href) = title.value().attr("href") else {
                continue;
            };
            let Some(url) = self.resolve_card_url(href) else {
                tracing::trace!("Skipping card with unusable link {}", href);
                continue;
            };
            let Some(vacancy_id) = vacancy_id_from_url(url.as_str()) else {
                tracing::trace!("Skipping card without vacancy id: {}", url);
                continue;
            };

            entries.push(ListEntry {
                vacancy_id,
                name: element_text(title).unwrap_or_default(),
                url: url.to_string(),
                employer_name: first_text(card, &self.selectors.card_employer),
                area_name: first_text(card, &self.selectors.card_address),
                published_at_text: first_text(card, &self.selectors.card_date),
            });
        }

        Ok(entries)
    }

    fn parse_detail_page(&self, body: &str, fallback: &ListEntry) -> Result<DetailRecord, ParseError> {
        let document = Html::parse_document(body);
        let root = document.root_element();
        let s = &self.selectors;

        let name = first_text(root, &s.title).unwrap_or_else(|| fallback.name.clone());
        if name.is_empty() {
            return Err(ParseError::MissingField {
                field: "name",
                url: fallback.url.clone(),
            });
        }

        let (salary_from, salary_to, salary_currency) = parse_salary(first_text(root, &s.salary).as_deref());

        let mut seen = HashSet::new();
        let skills = root
            .select(&s.skill)
            .filter_map(element_text)
            .filter(|skill| seen.insert(skill.clone()))
            .collect();

        let published_text = first_text(root, &s.creation_time).or_else(|| fallback.published_at_text.clone());

        Ok(DetailRecord {
            vacancy_id: vacancy_id_from_url(&fallback.url).unwrap_or(fallback.vacancy_id),
            name,
            url: fallback.url.clone(),
            employer_name: first_text(root, &s.company).or_else(|| fallback.employer_name.clone()),
            area_name: first_text(root, &s.location).or_else(|| fallback.area_name.clone()),
            published_at: parse_published_at(published_text.as_deref(), Utc::now()),
            salary_from,
            salary_to,
            salary_currency,
            schedule: first_text(root, &s.schedule),
            employment: first_text(root, &s.employment),
            experience: first_text(root, &s.experience),
            skills,
        })
    }
}

/// Extracts the numeric vacancy id from a vacancy URL
pub fn vacancy_id_from_url(url: &str) -> Option<i64> {
    VACANCY_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whitespace-normalized text of an element, `None` when blank
fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).find_map(element_text)
}

/// Parses a salary text into `(from, to, currency)`
///
/// Digits may be grouped with spaces or non-breaking spaces. "от" marks a
/// lower bound and "до" an upper bound; with neither, two numbers form a
/// range and a single number is both bounds.
///
/// ```
/// use vacancy_harvest::crawler::parse_salary;
///
/// let (from, to, currency) = parse_salary(Some("от 100 000 до 150 000 руб."));
/// assert_eq!((from, to, currency.as_deref()), (Some(100000), Some(150000), Some("RUR")));
/// ```
pub fn parse_salary(text: Option<&str>) -> (Option<i64>, Option<i64>, Option<String>) {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return (None, None, None);
    };

    let currency = salary_currency(text);
    let numbers: Vec<i64> = SALARY_NUMBER_RE
        .find_iter(text)
        .filter_map(|m| {
            let digits: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .collect();

    let has_from = FROM_RE.is_match(text);
    let has_to = TO_RE.is_match(text);

    let (from, to) = match numbers.as_slice() {
        [] => (None, None),
        [first, second, ..] if has_from && has_to => (Some(*first), Some(*second)),
        [first, ..] if has_from => (Some(*first), None),
        [first, ..] if has_to => (None, Some(*first)),
        [first, second, ..] => (Some(*first), Some(*second)),
        [only] => (Some(*only), Some(*only)),
    };

    (from, to, currency)
}

fn salary_currency(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let code = if lower.contains("руб") || lower.contains('₽') {
        "RUR"
    } else if lower.contains("usd") || lower.contains('$') {
        "USD"
    } else if lower.contains("eur") || lower.contains('€') {
        "EUR"
    } else if lower.contains("kzt") || lower.contains('₸') {
        "KZT"
    } else {
        return None;
    };
    Some(code.to_string())
}

fn russian_month(name: &str) -> Option<u32> {
    let month = match name {
        "января" => 1,
        "февраля" => 2,
        "марта" => 3,
        "апреля" => 4,
        "мая" => 5,
        "июня" => 6,
        "июля" => 7,
        "августа" => 8,
        "сентября" => 9,
        "октября" => 10,
        "ноября" => 11,
        "декабря" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parses a publication-date text relative to `now`
///
/// Understands "сегодня", "вчера" and "<day> <month> [year]" with Russian
/// genitive month names; the year defaults to the current one. Anything
/// else, including a missing text, yields `now`.
pub fn parse_published_at(text: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(text) = text else {
        return now;
    };
    let lower = text.to_lowercase();

    if lower.contains("сегодня") {
        return now;
    }
    if lower.contains("вчера") {
        return now - Duration::days(1);
    }

    let parsed = DATE_RE.captures(&lower).and_then(|caps| {
        let day: u32 = caps.get(1)?.as_str().parse().ok()?;
        let month = russian_month(caps.get(2)?.as_str())?;
        let year = match caps.get(3) {
            Some(y) => y.as_str().parse().ok()?,
            None => now.year(),
        };
        let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
        Some(Utc.from_utc_datetime(&naive))
    });

    parsed.unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_PAGE: &str = r#"
<html><body>
  <div class="serp-item">
    <a data-qa="serp-item__title" href="https://hh.ru/vacancy/101?query=rust&from=serp">Rust  Developer</a>
    <span data-qa="vacancy-serp__vacancy-employer">Acme&nbsp;Corp</span>
    <span data-qa="vacancy-serp__vacancy-address">Москва</span>
    <span data-qa="vacancy-serp__vacancy-date">вчера</span>
  </div>
  <div data-qa="vacancy-serp__vacancy">
    <a data-qa="serp-item__title" href="/vacancy/202">Backend Engineer</a>
  </div>
  <div class="serp-item">
    <span>Promoted block without a title link</span>
  </div>
  <div class="vacancy-serp-item">
    <a data-qa="serp-item__title" href="https://hh.ru/employer/5">Not a vacancy link</a>
  </div>
</body></html>
"#;

    const DETAIL_PAGE: &str = r#"
<html><body>
  <h1 data-qa="vacancy-title">Senior Rust Developer</h1>
  <a data-qa="vacancy-company-name"><span>Acme</span> <span>Corp</span></a>
  <p data-qa="vacancy-view-location">Санкт-Петербург</p>
  <div data-qa="vacancy-salary">от 100&nbsp;000 до 150&nbsp;000 руб. на руки</div>
  <span data-qa="vacancy-experience">3–6 лет</span>
  <p data-qa="vacancy-view-employment-mode">Полная занятость</p>
  <p data-qa="vacancy-schedule">Удаленная работа</p>
  <ul>
    <li data-qa="skills-element">Rust</li>
    <li data-qa="skills-element">PostgreSQL</li>
    <li data-qa="skills-element">Rust</li>
    <li data-qa="skills-element">  </li>
  </ul>
  <p data-qa="vacancy-view-creation-time">Вакансия опубликована 5 марта 2024 в Москве</p>
</body></html>
"#;

    fn parser() -> HtmlParser {
        HtmlParser::new()
            .unwrap()
            .with_base_url(Url::parse("https://hh.ru/search/vacancy").unwrap())
    }

    fn entry() -> ListEntry {
        ListEntry {
            vacancy_id: 101,
            name: "Rust Developer".to_string(),
            url: "https://hh.ru/vacancy/101".to_string(),
            employer_name: Some("Fallback Ltd".to_string()),
            area_name: Some("Москва".to_string()),
            published_at_text: Some("сегодня".to_string()),
        }
    }

    #[test]
    fn test_parse_list_page() {
        let entries = parser().parse_list_page(LIST_PAGE).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].vacancy_id, 101);
        assert_eq!(entries[0].name, "Rust Developer");
        assert_eq!(entries[0].url, "https://hh.ru/vacancy/101");
        assert_eq!(entries[0].employer_name.as_deref(), Some("Acme Corp"));
        assert_eq!(entries[0].area_name.as_deref(), Some("Москва"));
        assert_eq!(entries[0].published_at_text.as_deref(), Some("вчера"));

        assert_eq!(entries[1].vacancy_id, 202);
        assert_eq!(entries[1].url, "https://hh.ru/vacancy/202");
        assert_eq!(entries[1].employer_name, None);
    }

    #[test]
    fn test_relative_links_skipped_without_base() {
        let entries = HtmlParser::new().unwrap().parse_list_page(LIST_PAGE).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].vacancy_id, 101);
    }

    #[test]
    fn test_empty_page_yields_no_entries() {
        let entries = parser()
            .parse_list_page("<html><body><p>Ничего не найдено</p></body></html>")
            .unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_parse_detail_page() {
        let record = parser().parse_detail_page(DETAIL_PAGE, &entry()).unwrap();

        assert_eq!(record.vacancy_id, 101);
        assert_eq!(record.name, "Senior Rust Developer");
        assert_eq!(record.employer_name.as_deref(), Some("Acme Corp"));
        assert_eq!(record.area_name.as_deref(), Some("Санкт-Петербург"));
        assert_eq!(record.salary_from, Some(100_000));
        assert_eq!(record.salary_to, Some(150_000));
        assert_eq!(record.salary_currency.as_deref(), Some("RUR"));
        assert_eq!(record.experience.as_deref(), Some("3–6 лет"));
        assert_eq!(record.employment.as_deref(), Some("Полная занятость"));
        assert_eq!(record.schedule.as_deref(), Some("Удаленная работа"));
        assert_eq!(record.skills, vec!["Rust".to_string(), "PostgreSQL".to_string()]);
        assert_eq!(
            (record.published_at.year(), record.published_at.month(), record.published_at.day()),
            (2024, 3, 5)
        );
    }

    #[test]
    fn test_detail_falls_back_to_list_entry() {
        let record = parser()
            .parse_detail_page("<html><body><p>sparse</p></body></html>", &entry())
            .unwrap();

        assert_eq!(record.name, "Rust Developer");
        assert_eq!(record.employer_name.as_deref(), Some("Fallback Ltd"));
        assert_eq!(record.area_name.as_deref(), Some("Москва"));
        assert_eq!(record.salary_from, None);
        assert!(record.skills.is_empty());
    }

    #[test]
    fn test_detail_without_any_name_is_an_error() {
        let mut nameless = entry();
        nameless.name = String::new();
        let result = parser().parse_detail_page("<html></html>", &nameless);
        assert!(matches!(result, Err(ParseError::MissingField { field: "name", .. })));
    }

    #[test]
    fn test_vacancy_id_from_url() {
        assert_eq!(vacancy_id_from_url("https://hh.ru/vacancy/12345"), Some(12345));
        assert_eq!(vacancy_id_from_url("https://spb.hh.ru/vacancy/7?from=x"), Some(7));
        assert_eq!(vacancy_id_from_url("https://hh.ru/employer/5"), None);
    }

    #[test]
    fn test_parse_salary_range() {
        assert_eq!(
            parse_salary(Some("от 100 000 до 150 000 руб.")),
            (Some(100_000), Some(150_000), Some("RUR".to_string()))
        );
    }

    #[test]
    fn test_parse_salary_bounds() {
        assert_eq!(
            parse_salary(Some("от 80\u{00A0}000 ₽ на руки")),
            (Some(80_000), None, Some("RUR".to_string()))
        );
        assert_eq!(
            parse_salary(Some("до 3 000 USD")),
            (None, Some(3_000), Some("USD".to_string()))
        );
        assert_eq!(
            parse_salary(Some("120 000 – 180 000 руб.")),
            (Some(120_000), Some(180_000), Some("RUR".to_string()))
        );
        assert_eq!(parse_salary(Some("5000 €")), (Some(5_000), Some(5_000), Some("EUR".to_string())));
    }

    #[test]
    fn test_parse_salary_without_numbers() {
        assert_eq!(parse_salary(Some("Уровень дохода не указан")), (None, None, None));
        assert_eq!(parse_salary(Some("   ")), (None, None, None));
        assert_eq!(parse_salary(None), (None, None, None));
    }

    #[test]
    fn test_parse_published_at() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

        assert_eq!(parse_published_at(None, now), now);
        assert_eq!(parse_published_at(Some("Опубликовано сегодня"), now), now);
        assert_eq!(parse_published_at(Some("вчера"), now), now - Duration::days(1));
        assert_eq!(
            parse_published_at(Some("12 января"), now),
            Utc.with_ymd_and_hms(2024, 1, 12, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_published_at(Some("Вакансия опубликована 3 декабря 2023"), now),
            Utc.with_ymd_and_hms(2023, 12, 3, 0, 0, 0).unwrap()
        );
        assert_eq!(parse_published_at(Some("31 февраля"), now), now);
        assert_eq!(parse_published_at(Some("неизвестно"), now), now);
    }
}
