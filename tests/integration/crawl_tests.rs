//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the portal's listing, token
//! exchange and document endpoints and run the full crawl end-to-end.

use chrono::NaiveDate;
use gem_harvest::config::{
    Config, CrawlConfig, FilterConfig, OutputConfig, PortalConfig, SessionConfig,
};
use gem_harvest::crawler::Coordinator;
use gem_harvest::storage::{CompletionCache, CompletionStore};
use gem_harvest::{HarvestError, RecordId};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock portal
fn create_test_config(base_url: &str, workdir: &Path, from: &str, to: &str, repeat: bool) -> Config {
    Config {
        session: SessionConfig {
            cookie: "ci_session=test-session".to_string(),
        },
        crawl: CrawlConfig {
            from_date: from.to_string(),
            to_date: to.to_string(),
            repeat_till_date: repeat,
            throttle_time: 0,
            page_delay: 0,
        },
        filters: FilterConfig::default(),
        portal: PortalConfig {
            listing_url: format!("{}/listing", base_url),
            token_url: format!("{}/token", base_url),
            ..PortalConfig::default()
        },
        output: OutputConfig {
            root_dir: workdir.join("pdfs"),
            cache_path: workdir.join("downloaded_ids.txt"),
        },
    }
}

fn listing_html(ids: &[&str]) -> String {
    let blocks: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="border block">
                     <span>Contract No: {id}</span>
                     <a href="javascript:void(0)" onclick="viewContract('{id}')">View</a>
                   </div>"#
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", blocks)
}

fn empty_listing() -> String {
    "<html><body><p>No result found</p></body></html>".to_string()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Mounts listing pages for the window starting at `from`
async fn mount_listing(server: &MockServer, from: &str, pages: &[Vec<&str>]) {
    for (page, ids) in pages.iter().enumerate() {
        let body = if ids.is_empty() {
            empty_listing()
        } else {
            listing_html(ids)
        };
        Mock::given(method("POST"))
            .and(path("/listing"))
            .and(body_string_contains(format!("fromDate={}", from)))
            .and(body_string_contains(format!("page={}", page)))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(server)
            .await;
    }
}

/// Mounts a successful token exchange and document for `id`
async fn mount_document(server: &MockServer, id: &str) {
    let code = format!(
        "&lt;a href=&quot;/docs/{id}.pdf&quot; target=&quot;_blank&quot;&gt;Download&lt;/a&gt;"
    );
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(format!("oid={}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "status": "1", "code": code })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/docs/{}.pdf", id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(format!("%PDF-1.4 {}", id).into_bytes()),
        )
        .mount(server)
        .await;
}

async fn mount_rejection(server: &MockServer, id: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(format!("oid={}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "status": "0", "code": "" })),
        )
        .mount(server)
        .await;
}

fn seed_cache(path: &Path, ids: &[&str]) {
    let mut cache = CompletionCache::load(path).expect("Failed to load cache");
    for id in ids {
        cache
            .record(&RecordId::new(id).unwrap())
            .expect("Failed to seed cache");
    }
}

#[tokio::test]
async fn test_full_crawl_with_cached_and_rejected_records() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    mount_listing(
        &server,
        "01-01-2024",
        &[
            vec!["GEMC-1101", "GEMC-1202", "GEMC-1303", "GEMC-1404", "GEMC-1505"],
            vec![],
        ],
    )
    .await;
    mount_document(&server, "GEMC-1404").await;
    mount_rejection(&server, "GEMC-1505").await;

    let config = create_test_config(&server.uri(), workdir.path(), "01-01-2024", "31-03-2024", false);
    seed_cache(&config.output.cache_path, &["GEMC-1101", "GEMC-1202", "GEMC-1303"]);

    let mut coordinator = Coordinator::new(config.clone()).expect("Failed to create coordinator");
    let stats = coordinator.run_until(today()).await.expect("Crawl failed");

    assert_eq!(stats.scraped, 5);
    assert_eq!(stats.skipped, 3);
    assert_eq!(stats.downloaded, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.failures.get("remote-rejected"), Some(&1));
    assert_eq!(stats.windows_completed, 1);
    assert_eq!(stats.pages, 2);

    let document = workdir
        .path()
        .join("pdfs/01-01-2024_to_31-03-2024/GEMC-1404.pdf");
    assert_eq!(std::fs::read(&document).unwrap(), b"%PDF-1.4 GEMC-1404");
    assert!(!workdir
        .path()
        .join("pdfs/01-01-2024_to_31-03-2024/GEMC-1505.pdf")
        .exists());

    let log = std::fs::read_to_string(&config.output.cache_path).unwrap();
    assert_eq!(log, "GEMC-1101\nGEMC-1202\nGEMC-1303\nGEMC-1404\n");
}

#[tokio::test]
async fn test_second_run_skips_everything() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    for _ in 0..2 {
        // Each run walks page 0 and page 1 once
        Mock::given(method("POST"))
            .and(path("/listing"))
            .and(body_string_contains("page=0"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(listing_html(&["GEMC-2101", "GEMC-2202"])),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/listing"))
            .and(body_string_contains("page=1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(empty_listing()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }
    mount_document(&server, "GEMC-2101").await;
    mount_document(&server, "GEMC-2202").await;

    let config = create_test_config(&server.uri(), workdir.path(), "01-01-2024", "31-03-2024", false);

    let mut first = Coordinator::new(config.clone()).unwrap();
    let stats = first.run_until(today()).await.unwrap();
    assert_eq!(stats.downloaded, 2);
    assert_eq!(stats.skipped, 0);
    drop(first);

    let mut second = Coordinator::new(config.clone()).unwrap();
    let stats = second.run_until(today()).await.unwrap();
    assert_eq!(stats.scraped, 2);
    assert_eq!(stats.downloaded, 0);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.failed, 0);

    // Only the first run touched the token endpoint
    let token_calls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/token")
        .count();
    assert_eq!(token_calls, 2);

    let log = std::fs::read_to_string(&config.output.cache_path).unwrap();
    assert_eq!(log.lines().count(), 2);
}

#[tokio::test]
async fn test_document_on_disk_without_log_entry_is_downloaded_again() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    mount_listing(&server, "01-01-2024", &[vec!["GEMC-3101"], vec![]]).await;
    mount_document(&server, "GEMC-3101").await;

    let config = create_test_config(&server.uri(), workdir.path(), "01-01-2024", "31-03-2024", false);

    // A previous run wrote the file but died before appending to the log
    let dir = workdir.path().join("pdfs/01-01-2024_to_31-03-2024");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("GEMC-3101.pdf"), b"%PDF-1.4 trunc").unwrap();

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let stats = coordinator.run_until(today()).await.unwrap();

    assert_eq!(stats.downloaded, 1);
    assert_eq!(stats.skipped, 0);
    assert_eq!(
        std::fs::read(dir.join("GEMC-3101.pdf")).unwrap(),
        b"%PDF-1.4 GEMC-3101"
    );
    assert!(coordinator
        .cache()
        .contains(&RecordId::new("GEMC-3101").unwrap()));
}

#[tokio::test]
async fn test_empty_page_stops_pagination() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    mount_listing(&server, "01-01-2024", &[vec![]]).await;
    Mock::given(method("POST"))
        .and(path("/listing"))
        .and(body_string_contains("page=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&["GEMC-4101"])))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), workdir.path(), "01-01-2024", "31-03-2024", false);
    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let stats = coordinator.run_until(today()).await.unwrap();

    assert_eq!(stats.scraped, 0);
    assert_eq!(stats.pages, 1);
    assert_eq!(stats.windows_completed, 1);
    // Nothing downloaded, so no log and no window directory
    assert!(!config.output.cache_path.exists());
    assert!(!config.output.root_dir.exists());
}

#[tokio::test]
async fn test_listing_failure_aborts_only_its_window() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/listing"))
        .and(body_string_contains("fromDate=01-01-2024"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    mount_listing(&server, "01-04-2024", &[vec!["GEMC-5101"], vec![]]).await;
    mount_document(&server, "GEMC-5101").await;

    let config = create_test_config(&server.uri(), workdir.path(), "01-01-2024", "31-03-2024", true);
    let ceiling = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();

    let mut coordinator = Coordinator::new(config).unwrap();
    let stats = coordinator.run_until(ceiling).await.unwrap();

    assert_eq!(stats.windows_aborted, 1);
    assert_eq!(stats.windows_completed, 1);
    assert_eq!(stats.downloaded, 1);
    assert!(workdir
        .path()
        .join("pdfs/01-04-2024_to_10-04-2024/GEMC-5101.pdf")
        .exists());
}

#[tokio::test]
async fn test_repeat_from_yesterday_adds_one_window_ending_today() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    mount_listing(&server, "10-01-2024", &[vec![]]).await;
    Mock::given(method("POST"))
        .and(path("/listing"))
        .and(body_string_contains("fromDate=10-04-2024"))
        .and(body_string_contains("toDate=10-04-2024"))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_listing()))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), workdir.path(), "10-01-2024", "09-04-2024", true);
    let ceiling = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();

    let mut coordinator = Coordinator::new(config).unwrap();
    let stats = coordinator.run_until(ceiling).await.unwrap();

    assert_eq!(stats.windows_completed, 2);
    assert_eq!(stats.pages, 2);
}

#[tokio::test]
async fn test_item_failures_do_not_stop_siblings() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    mount_listing(
        &server,
        "01-01-2024",
        &[vec!["GEMC-6101", "GEMC-6202", "GEMC-6303", "GEMC-6404"], vec![]],
    )
    .await;

    // Token exchange transport failure
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("oid=GEMC-6101"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    // Success status but no link in the payload
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("oid=GEMC-6202"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "status": "1", "code": "<p>Please retry</p>" })),
        )
        .mount(&server)
        .await;

    // Link resolves but the document is missing
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("oid=GEMC-6303"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "status": "1", "code": "<a href=\"/docs/missing.pdf\">x</a>" }),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    mount_document(&server, "GEMC-6404").await;

    let config = create_test_config(&server.uri(), workdir.path(), "01-01-2024", "31-03-2024", false);
    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let stats = coordinator.run_until(today()).await.unwrap();

    assert_eq!(stats.scraped, 4);
    assert_eq!(stats.failed, 3);
    assert_eq!(stats.downloaded, 1);
    assert_eq!(stats.failures.get("transport"), Some(&2));
    assert_eq!(stats.failures.get("no-link-found"), Some(&1));

    let log = std::fs::read_to_string(&config.output.cache_path).unwrap();
    assert_eq!(log, "GEMC-6404\n");
}

#[tokio::test]
async fn test_requests_carry_session_and_filters() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/listing"))
        .and(header("cookie", "ci_session=test-session"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(body_string_contains("department=Ministry+of+Railways"))
        .and(body_string_contains("bno=42"))
        .and(body_string_contains("toDate=31-03-2024"))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_listing()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), workdir.path(), "01-01-2024", "31-03-2024", false);
    config.filters.department = "Ministry of Railways".to_string();
    config.filters.bno = "42".to_string();

    let mut coordinator = Coordinator::new(config).unwrap();
    let stats = coordinator.run_until(today()).await.unwrap();
    assert_eq!(stats.windows_completed, 1);
}

#[tokio::test]
async fn test_invalid_config_creates_no_state() {
    let workdir = TempDir::new().unwrap();
    let mut config = create_test_config(
        "http://127.0.0.1:9",
        workdir.path(),
        "01-04-2024",
        "31-03-2024",
        false,
    );

    let result = Coordinator::new(config.clone());
    assert!(matches!(result, Err(HarvestError::Config(_))));

    config.crawl.from_date = "01-01-2024".to_string();
    config.session.cookie = String::new();
    assert!(matches!(
        Coordinator::new(config.clone()),
        Err(HarvestError::Config(_))
    ));

    assert!(!config.output.cache_path.exists());
    assert!(!config.output.root_dir.exists());
}

#[tokio::test]
async fn test_preloaded_cache_is_honoured() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    mount_listing(
        &server,
        "01-01-2024",
        &[vec!["GEMC-7101", "GEMC-7202", "GEMC-7303"], vec![]],
    )
    .await;
    mount_document(&server, "GEMC-7303").await;

    let config = create_test_config(&server.uri(), workdir.path(), "01-01-2024", "31-03-2024", false);

    // The cache comes from a log outside the configured cache-path
    let mut cache = CompletionCache::load(&workdir.path().join("elsewhere.txt")).unwrap();
    cache.record(&RecordId::new("GEMC-7101").unwrap()).unwrap();
    cache.record(&RecordId::new("GEMC-7202").unwrap()).unwrap();

    let mut coordinator = Coordinator::with_cache(config.clone(), cache).unwrap();
    let stats = coordinator.run_until(today()).await.unwrap();

    assert_eq!(stats.scraped, 3);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.downloaded, 1);
    assert_eq!(coordinator.cache().len(), 3);

    let token_calls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/token")
        .count();
    assert_eq!(token_calls, 1);

    // Appends go to the log the cache was loaded from
    assert!(!config.output.cache_path.exists());
    let log = std::fs::read_to_string(workdir.path().join("elsewhere.txt")).unwrap();
    assert_eq!(log, "GEMC-7101\nGEMC-7202\nGEMC-7303\n");
}

#[tokio::test]
async fn test_storage_failure_leaves_records_for_next_run() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/listing"))
        .and(body_string_contains("page=0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_html(&["GEMC-8101", "GEMC-8202"])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/listing"))
        .and(body_string_contains("page=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_listing()))
        .mount(&server)
        .await;
    mount_document(&server, "GEMC-8101").await;
    mount_document(&server, "GEMC-8202").await;

    let mut config = create_test_config(&server.uri(), workdir.path(), "01-01-2024", "31-03-2024", false);

    // A regular file where the output root should be makes every write fail
    let blocked = workdir.path().join("blocked");
    std::fs::write(&blocked, b"not a directory").unwrap();
    config.output.root_dir = blocked;

    let mut first = Coordinator::new(config.clone()).unwrap();
    let stats = first.run_until(today()).await.unwrap();

    assert_eq!(stats.scraped, 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.downloaded, 0);
    assert_eq!(stats.failures.get("storage"), Some(&2));
    assert!(!config.output.cache_path.exists());
    drop(first);

    config.output.root_dir = workdir.path().join("pdfs");
    let mut second = Coordinator::new(config.clone()).unwrap();
    let stats = second.run_until(today()).await.unwrap();

    assert_eq!(stats.downloaded, 2);
    assert_eq!(stats.skipped, 0);
    let log = std::fs::read_to_string(&config.output.cache_path).unwrap();
    assert_eq!(log, "GEMC-8101\nGEMC-8202\n");
}

#[tokio::test]
async fn test_listing_pages_are_paced() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    mount_listing(&server, "01-01-2024", &[vec!["GEMC-9101"], vec![]]).await;
    mount_document(&server, "GEMC-9101").await;

    let mut config = create_test_config(&server.uri(), workdir.path(), "01-01-2024", "31-03-2024", false);
    config.crawl.page_delay = 50;

    let started = std::time::Instant::now();
    let mut coordinator = Coordinator::new(config).unwrap();
    let stats = coordinator.run_until(today()).await.unwrap();

    assert_eq!(stats.pages, 2);
    assert!(started.elapsed() >= std::time::Duration::from_millis(50));
}
