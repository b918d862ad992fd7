//! Repeated crawls against the same database: no duplicates, updates in
//! place and skill replacement

use crate::common::*;
use tempfile::TempDir;
use vacancy_harvest::crawl_and_store;
use vacancy_harvest::storage::{area_id_for_name, Storage};
use wiremock::MockServer;

#[tokio::test]
async fn test_repeated_crawl_creates_no_duplicates() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let cards = [card(601, "Backend"), card(602, "Frontend"), card(603, "Data")];
    mount_list_page(&server, 0, &cards).await;
    mount_list_page(&server, 1, &[]).await;
    for (id, name) in [(601, "Backend"), (602, "Frontend"), (603, "Data")] {
        mount_detail(&server, id, detail_page(name, "от 100 000 до 150 000 руб.", &["SQL", "Git"])).await;
    }

    let config = test_config(&server, &dir, 2);
    let first = crawl_and_store(&config).await.unwrap();
    let second = crawl_and_store(&config).await.unwrap();

    assert_eq!(first.stored, 3);
    assert_eq!(second.stored, 3);

    let storage = open(&config);
    assert_eq!(storage.count_vacancies().unwrap(), 3);
    assert_eq!(storage.count_employers().unwrap(), 1);
    assert_eq!(storage.count_areas().unwrap(), 1);
    assert_eq!(storage.count_skills().unwrap(), 2);
    assert_eq!(storage.count_skill_links().unwrap(), 6);
}

#[tokio::test]
async fn test_recrawl_updates_in_place_and_replaces_skills() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir, 2);

    mount_list_page(&server, 0, &[card(701, "Analyst")]).await;
    mount_list_page(&server, 1, &[]).await;
    mount_detail(
        &server,
        701,
        detail_page("Analyst", "от 100 000 до 150 000 руб.", &["Python", "SQL"]),
    )
    .await;

    crawl_and_store(&config).await.unwrap();
    let before = open(&config).get_vacancy(701).unwrap().unwrap();
    assert_eq!(before.salary_from, Some(100_000));
    assert_eq!(before.salary_to, Some(150_000));
    assert_eq!(before.salary_currency.as_deref(), Some("RUR"));

    // The posting changes on the site
    server.reset().await;
    mount_list_page(&server, 0, &[card(701, "Analyst")]).await;
    mount_list_page(&server, 1, &[]).await;
    mount_detail(
        &server,
        701,
        detail_page("Senior Analyst", "от 180 000 до 220 000 руб.", &["Python"]),
    )
    .await;

    crawl_and_store(&config).await.unwrap();

    let storage = open(&config);
    let after = storage.get_vacancy(701).unwrap().unwrap();

    assert_eq!(after.id, before.id);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.name, "Senior Analyst");
    assert_eq!(after.salary_from, Some(180_000));
    assert_eq!(after.salary_to, Some(220_000));
    assert_eq!(storage.vacancy_skills(after.id).unwrap(), vec!["Python"]);
    assert_eq!(storage.count_vacancies().unwrap(), 1);

    // Unlinked skills stay in the vocabulary
    assert_eq!(storage.count_skills().unwrap(), 2);
}

#[tokio::test]
async fn test_area_id_is_stable_across_databases() {
    let server = MockServer::start().await;
    mount_list_page(&server, 0, &[card(801, "Support")]).await;
    mount_list_page(&server, 1, &[]).await;
    mount_detail(&server, 801, detail_page("Support", "", &[])).await;

    let mut ids = Vec::new();
    for _ in 0..2 {
        let dir = TempDir::new().unwrap();
        let config = test_config(&server, &dir, 2);
        crawl_and_store(&config).await.unwrap();

        let area = open(&config).get_area_by_name("Москва").unwrap().unwrap();
        ids.push(area.id);
    }

    assert_eq!(ids[0], ids[1]);
    assert_eq!(ids[0], area_id_for_name("Москва"));
}
