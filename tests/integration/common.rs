//! Shared fixtures: page markup, mock mounting and test configuration

use tempfile::TempDir;
use vacancy_harvest::config::Config;
use vacancy_harvest::storage::{open_storage, SqliteStorage};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SEARCH_PATH: &str = "/search/vacancy";

/// A card on a result page
pub struct Card {
    pub id: i64,
    pub name: &'static str,
}

pub fn card(id: i64, name: &'static str) -> Card {
    Card { id, name }
}

/// Renders a result page with the given cards
pub fn list_page(cards: &[Card]) -> String {
    let mut html = String::from("<html><body><main>");
    for card in cards {
        html.push_str(&format!(
            r#"<div data-qa="vacancy-serp__vacancy">
                 <a data-qa="serp-item__title" href="/vacancy/{id}?query=rust&amp;hhtmFrom=serp">{name}</a>
                 <div data-qa="vacancy-serp__vacancy-employer">Acme</div>
                 <div data-qa="vacancy-serp__vacancy-address">Москва</div>
               </div>"#,
            id = card.id,
            name = card.name,
        ));
    }
    html.push_str("</main></body></html>");
    html
}

/// Renders a vacancy page
pub fn detail_page(name: &str, salary: &str, skills: &[&str]) -> String {
    let skills: String = skills
        .iter()
        .map(|s| format!(r#"<li data-qa="skills-element">{}</li>"#, s))
        .collect();
    format!(
        r#"<html><body>
             <h1 data-qa="vacancy-title">{name}</h1>
             <div data-qa="vacancy-salary">{salary}</div>
             <a data-qa="vacancy-company-name">Acme</a>
             <p data-qa="vacancy-view-location">Москва</p>
             <span data-qa="vacancy-experience">1–3 года</span>
             <ul>{skills}</ul>
           </body></html>"#
    )
}

/// Mounts result page `page`
pub async fn mount_list_page(server: &MockServer, page: u32, cards: &[Card]) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_page(cards)))
        .mount(server)
        .await;
}

/// Mounts the vacancy page for `id`
pub async fn mount_detail(server: &MockServer, id: i64, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/vacancy/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// A configuration pointing at the mock server with fast retries, no
/// pacing and no response cache
pub fn test_config(server: &MockServer, dir: &TempDir, pages: u32) -> Config {
    let mut config = Config::default();
    config.search.text = "rust".to_string();
    config.search.pages = pages;
    config.search.per_page = 20;

    config.crawler.concurrency = 4;
    config.crawler.request_timeout_secs = 5;
    config.crawler.max_attempts = 5;
    config.crawler.backoff_base_ms = 1;
    config.crawler.backoff_max_ms = 5;
    config.crawler.backoff_jitter_ms = 0;
    config.crawler.politeness_delay_ms = 0;

    config.http.search_url = format!("{}{}", server.uri(), SEARCH_PATH);
    config.cache.enabled = false;
    config.cache.path = dir.path().join("cache.sqlite3").display().to_string();
    config.output.database_url = dir.path().join("hh.sqlite3").display().to_string();
    config
}

pub fn open(config: &Config) -> SqliteStorage {
    open_storage(&config.output.database_url).unwrap()
}
