//! End-to-end crawl behaviour: pagination, retries, failure isolation,
//! caching and startup failures

use crate::common::*;
use tempfile::TempDir;
use vacancy_harvest::storage::Storage;
use vacancy_harvest::{crawl_and_store, HarvestError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_pagination_stops_on_empty_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_list_page(&server, 0, &[card(101, "Rust developer"), card(102, "Go developer")]).await;
    mount_list_page(&server, 1, &[]).await;
    mount_detail(&server, 101, detail_page("Rust developer", "от 100 000 руб.", &["Rust"])).await;
    mount_detail(&server, 102, detail_page("Go developer", "до 90 000 руб.", &["Go"])).await;

    // Never reached
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_page(&[card(103, "Late")])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vacancy/103"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(&server, &dir, 3);
    let summary = crawl_and_store(&config).await.unwrap();

    assert_eq!(summary.stored, 2);
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(open(&config).count_vacancies().unwrap(), 2);
}

#[tokio::test]
async fn test_list_request_carries_search_parameters() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("text", "rust"))
        .and(query_param("page", "0"))
        .and(query_param("items_on_page", "20"))
        .and(query_param("area", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_page(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server, &dir, 1);
    config.search.area = Some(2);

    let summary = crawl_and_store(&config).await.unwrap();
    assert_eq!(summary.stored, 0);
    assert!(!summary.list_page_failed);
}

#[tokio::test]
async fn test_detail_retry_then_success() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_list_page(&server, 0, &[card(201, "Flaky")]).await;
    mount_list_page(&server, 1, &[]).await;

    // Four failures, then the real page
    Mock::given(method("GET"))
        .and(path("/vacancy/201"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(4)
        .expect(4)
        .mount(&server)
        .await;
    mount_detail(&server, 201, detail_page("Flaky", "", &[])).await;

    let config = test_config(&server, &dir, 2);
    let summary = crawl_and_store(&config).await.unwrap();

    assert_eq!(summary.stored, 1);
    assert_eq!(summary.failed, 0);
    assert!(open(&config).get_vacancy(201).unwrap().is_some());
}

#[tokio::test]
async fn test_partial_batch_isolation() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let cards = [
        card(301, "One"),
        card(302, "Two"),
        card(303, "Three"),
        card(304, "Four"),
    ];
    mount_list_page(&server, 0, &cards).await;
    mount_list_page(&server, 1, &[]).await;
    mount_detail(&server, 301, detail_page("One", "", &[])).await;
    mount_detail(&server, 303, detail_page("Three", "", &[])).await;

    for id in [302, 304] {
        Mock::given(method("GET"))
            .and(path(format!("/vacancy/{}", id)))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
    }

    let mut config = test_config(&server, &dir, 2);
    config.crawler.max_attempts = 3;

    let summary = crawl_and_store(&config).await.unwrap();

    assert_eq!(summary.stored, 2);
    assert_eq!(summary.failed, 2);

    let storage = open(&config);
    assert_eq!(storage.count_vacancies().unwrap(), 2);
    assert!(storage.get_vacancy(301).unwrap().is_some());
    assert!(storage.get_vacancy(302).unwrap().is_none());
    assert!(storage.get_vacancy(303).unwrap().is_some());

    // Every failing page used its whole retry budget
    let requests = server.received_requests().await.unwrap();
    let attempts = requests
        .iter()
        .filter(|r| r.url.path() == "/vacancy/302")
        .count();
    assert_eq!(attempts, 3);
}

#[tokio::test]
async fn test_unreachable_list_page_ends_crawl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_list_page(&server, 0, &[card(401, "Kept")]).await;
    mount_detail(&server, 401, detail_page("Kept", "", &[])).await;
    // Page 1 is not mounted, so the server answers 404

    let mut config = test_config(&server, &dir, 3);
    config.crawler.max_attempts = 2;

    let summary = crawl_and_store(&config).await.unwrap();

    assert_eq!(summary.stored, 1);
    assert!(summary.list_page_failed);
}

#[tokio::test]
async fn test_cached_responses_are_not_refetched() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_page(&[card(501, "Cached")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vacancy/501"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(detail_page("Cached", "", &["SQL"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server, &dir, 1);
    config.cache.enabled = true;
    config.cache.ttl_minutes = 60;

    let first = crawl_and_store(&config).await.unwrap();
    let second = crawl_and_store(&config).await.unwrap();

    assert_eq!(first.stored, 1);
    assert_eq!(second.stored, 1);
    assert_eq!(open(&config).count_vacancies().unwrap(), 1);
}

#[tokio::test]
async fn test_missing_cookie_file_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let mut config = test_config(&server, &dir, 1);
    config.http.cookies_file = Some(dir.path().join("absent.txt").display().to_string());

    let result = crawl_and_store(&config).await;

    assert!(matches!(result, Err(HarvestError::Cookie(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_cookie_file_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let cookies = dir.path().join("cookies.json");
    std::fs::write(&cookies, r#"[{"name": "hhtoken", "value": "#).unwrap();

    let mut config = test_config(&server, &dir, 1);
    config.http.cookies_file = Some(cookies.display().to_string());

    let result = crawl_and_store(&config).await;
    assert!(matches!(result, Err(HarvestError::Cookie(_))));
}

#[tokio::test]
async fn test_cookie_file_allows_crawl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let cookies = dir.path().join("cookies.txt");
    std::fs::write(
        &cookies,
        "# Netscape HTTP Cookie File\n.hh.ru\tTRUE\t/\tTRUE\t0\thhtoken\tabc123\n",
    )
    .unwrap();

    mount_list_page(&server, 0, &[]).await;

    let mut config = test_config(&server, &dir, 1);
    config.http.cookies_file = Some(cookies.display().to_string());

    let summary = crawl_and_store(&config).await.unwrap();
    assert_eq!(summary.stored, 0);
}
