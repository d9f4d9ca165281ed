//! Integration tests for the scraper
//!
//! These tests use wiremock to serve index pages and test the full
//! fetch, extract and persist cycle end-to-end against a SQLite file.

use rental_scout::config::{parse_config, Config};
use rental_scout::crawler::{build_scheduler, scrape_once};
use rental_scout::storage::{ListingStore, SqliteStorage};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SAN_FRANCISCO_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
  <ul class="photo-cards">
    <li>
      <article class="list-card">
        <a class="list-card-link" href="/homes/for_rent/1200-market-st/">Bright studio on Market</a>
        <div class="list-card-price">$2,450/mo</div>
        <address class="list-card-addr">1200 Market St, San Francisco, CA</address>
        <ul class="list-card-details"><li>0 bds</li><li>1 ba</li><li>480 sqft</li></ul>
        <img class="list-card-img" src="https://photos.example.com/1200-market.jpg">
      </article>
    </li>
    <li>
      <article class="list-card">
        <a class="list-card-link" href="/apartments/san-francisco-ca/the-mission/">The Mission Lofts</a>
        <div class="list-card-price">3100</div>
        <ul class="list-card-details"><li>2 bds</li><li>1.5 ba</li><li>1,050 sqft</li></ul>
        <img class="list-card-img" data-src="https://photos.example.com/mission.jpg">
      </article>
    </li>
    <li>
      <article class="list-card">
        <a class="list-card-link" href="/homedetails/42_zpid/">Detail page only</a>
        <div class="list-card-price">$9,999</div>
      </article>
    </li>
    <li>
      <article class="list-card">
        <div class="list-card-price">$1,000</div>
      </article>
    </li>
  </ul>
</body>
</html>"#;

const MIAMI_PAGE: &str = r#"<html><body>
  <article class="list-card">
    <a class="list-card-link" href="/homes/for_rent/88-ocean-dr/"></a>
    <div class="list-card-price">Contact for price</div>
  </article>
</body></html>"#;

fn test_config(base_url: &str, locations: &[&str], db_path: &Path) -> Config {
    let locations = locations
        .iter()
        .map(|l| format!("\"{}\"", l))
        .collect::<Vec<_>>()
        .join(", ");

    parse_config(&format!(
        r#"
[scheduler]
interval-hours = 24

[policy]
allowed-paths = ["/homes/for_rent/", "/homes/for_sale/", "/apartments/"]
disallowed-paths = ["/homedetails/", "/myzillow/", "/profile/", "/homes/for_rent/private-"]
crawl-delay = 0
jitter-min-ms = 0
jitter-max-ms = 0

[request]
user-agent = "Mozilla/5.0 (X11; Linux x86_64) RentalScoutTest/1.0"
timeout-secs = 5

[storage]
database-path = "{}"

[[source]]
name = "zillow.com"
base-url = "{}"
index-path = "/homes/for_rent/{{location}}/"
locations = [{}]
"#,
        db_path.display(),
        base_url,
        locations
    ))
    .expect("test config should be valid")
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_persists_listings_and_summary() {
    let server = MockServer::start().await;
    mount_page(&server, "/homes/for_rent/san-francisco-ca/", SAN_FRANCISCO_PAGE).await;
    mount_page(&server, "/homes/for_rent/miami-fl/", MIAMI_PAGE).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("scout.db");
    let config = test_config(&server.uri(), &["san-francisco-ca", "miami-fl"], &db_path);

    let report = scrape_once(&config).await.unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert!(report.outcomes[0].succeeded());
    let summary = report.outcomes[0].result.as_ref().unwrap();
    assert_eq!(summary.listings_found, 3);
    assert_eq!(summary.listings_added, 3);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_listings().unwrap(), 3);

    let studio = storage
        .find_listing_by_url(&format!("{}/homes/for_rent/1200-market-st/", server.uri()))
        .unwrap()
        .expect("studio should be stored")
        .listing;
    assert_eq!(studio.title, "Bright studio on Market");
    assert_eq!(studio.price, 2450.0);
    assert_eq!(studio.bedrooms, 0);
    assert_eq!(studio.bathrooms, 1.0);
    assert_eq!(studio.square_footage, 480.0);
    assert_eq!(studio.city, "San Francisco");
    assert_eq!(studio.state, "CA");
    assert_eq!(studio.source, "zillow.com");

    let lofts = storage
        .find_listing_by_url(&format!(
            "{}/apartments/san-francisco-ca/the-mission/",
            server.uri()
        ))
        .unwrap()
        .expect("lofts should be stored")
        .listing;
    assert_eq!(lofts.price, 3100.0);
    assert_eq!(lofts.bathrooms, 1.5);
    assert_eq!(lofts.square_footage, 1050.0);
    assert_eq!(lofts.image_url, "https://photos.example.com/mission.jpg");

    let miami = storage
        .find_listing_by_url(&format!("{}/homes/for_rent/88-ocean-dr/", server.uri()))
        .unwrap()
        .expect("miami listing should be stored")
        .listing;
    assert_eq!(miami.title, "Apartment for Rent");
    assert_eq!(miami.price, 0.0);
    assert_eq!(miami.city, "Miami");
    assert_eq!(miami.state, "FL");

    let runs = storage.recent_run_summaries(10).unwrap();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].summary.success);
    assert_eq!(runs[0].summary.listings_found, 3);
    assert!(runs[0].summary.end_time.is_some());
}

#[tokio::test]
async fn test_all_fetches_failing_still_completes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("scout.db");
    let config = test_config(&server.uri(), &["san-francisco-ca", "miami-fl"], &db_path);

    let report = scrape_once(&config).await.unwrap();

    let summary = report.outcomes[0].result.as_ref().unwrap();
    assert!(summary.success);
    assert_eq!(summary.listings_found, 0);
    assert_eq!(summary.listings_added, 0);
    assert!(summary.error_message.is_none());

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_listings().unwrap(), 0);
    assert_eq!(storage.recent_run_summaries(10).unwrap().len(), 1);
}

#[tokio::test]
async fn test_disallowed_index_is_never_requested() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAN_FRANCISCO_PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("scout.db");
    let config = test_config(&server.uri(), &["private-ny"], &db_path);

    let report = scrape_once(&config).await.unwrap();

    let summary = report.outcomes[0].result.as_ref().unwrap();
    assert!(summary.success);
    assert_eq!(summary.listings_found, 0);
}

#[tokio::test]
async fn test_repeated_runs_append_listings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/homes/for_rent/miami-fl/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MIAMI_PAGE))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("scout.db");
    let config = test_config(&server.uri(), &["miami-fl"], &db_path);

    scrape_once(&config).await.unwrap();
    scrape_once(&config).await.unwrap();

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_listings().unwrap(), 2);
    assert_eq!(storage.recent_run_summaries(10).unwrap().len(), 2);
}

#[tokio::test]
async fn test_scheduler_fires_on_start_and_stops() {
    let server = MockServer::start().await;
    mount_page(&server, "/homes/for_rent/miami-fl/", MIAMI_PAGE).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("scout.db");
    let config = test_config(&server.uri(), &["miami-fl"], &db_path);

    let handle = build_scheduler(&config).unwrap().start();
    assert!(handle.is_running());

    let storage = SqliteStorage::new(&db_path).unwrap();
    let mut waited = Duration::ZERO;
    while storage.recent_run_summaries(1).unwrap().is_empty() && waited < Duration::from_secs(10) {
        tokio::time::sleep(Duration::from_millis(50)).await;
        waited += Duration::from_millis(50);
    }

    handle.stop();
    assert_eq!(handle.join().await.unwrap(), 1);
    assert_eq!(storage.count_listings().unwrap(), 1);
}
