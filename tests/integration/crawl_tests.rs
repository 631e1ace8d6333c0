//! Integration tests for the archiver
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, reading the archive back from disk.

use offline_archiver::config::Config;
use offline_archiver::crawler::Coordinator;
use offline_archiver::output::ErrorKind;
use offline_archiver::url::{PathMapper, PathRole};
use offline_archiver::{run_archive, ArchiveError};
use std::path::Path;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short timeouts
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.timeout_secs = 5;
    config.crawler.connect_timeout_secs = 2;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

fn read_string(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative))
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative, e))
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/about">About</a>
           <img src="logo.png">
           <a href="https://other.com">Other</a>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_page(r#"<a href="/">Home</a><img src="/logo.png">"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![137u8, 80, 78, 71], "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    let root = output.path();
    let index = read_string(root, "index.html");
    assert!(index.contains(r#"href="about/index.html""#));
    assert!(index.contains(r#"src="logo.png""#));
    assert!(index.contains(r#"href="https://other.com""#));

    let about = read_string(root, "about/index.html");
    assert!(about.contains(r#"href="../index.html""#));
    assert!(about.contains(r#"src="../logo.png""#));

    assert_eq!(std::fs::read(root.join("logo.png")).unwrap(), vec![137u8, 80, 78, 71]);
    assert!(root.join("_bookmarks.html").exists());

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.pages_saved, 2);
    assert_eq!(report.assets_saved, 1);
    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
}

#[tokio::test]
async fn test_missing_asset_is_not_fatal() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    // /missing.png is not mounted, so the mock server answers 404
    mount_page(&mock_server, "/", r#"<img src="/missing.png"><p>still here</p>"#).await;

    let report = run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    let index = read_string(output.path(), "index.html");
    assert!(index.contains(r#"src="/missing.png""#));
    assert!(index.contains("still here"));

    assert_eq!(report.pages_saved, 1);
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.errors[0].kind, ErrorKind::Fetch);
    assert!(report.errors[0].url.ends_with("/missing.png"));
}

#[tokio::test]
async fn test_link_cycle_terminates() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    for (route, body) in [
        ("/", r#"<a href="/a">A</a>"#),
        ("/a", r#"<a href="/">Home</a><a href="/b">B</a>"#),
        ("/b", r#"<a href="/a">A</a><a href="/b#self">Self</a>"#),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html_page(body))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let report = run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    assert_eq!(report.pages_visited, 3);
    assert_eq!(report.pages_saved, 3);
    assert!(output.path().join("a/index.html").exists());
    assert!(output.path().join("b/index.html").exists());

    let b = read_string(output.path(), "b/index.html");
    assert!(b.contains(r#"href="index.html#self""#));
}

#[tokio::test]
async fn test_directory_seed_maps_to_nested_index() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(&mock_server, "/docs/", "<p>Docs</p>").await;

    let seed = format!("{}/docs/", mock_server.uri());
    let report = run_archive(create_test_config(), &seed, output.path())
        .await
        .unwrap();

    assert_eq!(report.pages_saved, 1);
    assert!(output.path().join("docs/index.html").exists());
    assert!(!output.path().join("index.html").exists());
}

#[tokio::test]
async fn test_recrawl_is_byte_identical() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/about" class="nav" id="about-link">About</a>
           <img alt="Logo" src="/logo.png" width="32" height="32">"#,
    )
    .await;
    mount_page(&mock_server, "/about", "<p>About us</p>").await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "image/png"))
        .mount(&mock_server)
        .await;

    run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();
    let first_index = std::fs::read(output.path().join("index.html")).unwrap();
    let first_about = std::fs::read(output.path().join("about/index.html")).unwrap();

    run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();
    let second_index = std::fs::read(output.path().join("index.html")).unwrap();
    let second_about = std::fs::read(output.path().join("about/index.html")).unwrap();

    assert_eq!(first_index, second_index);
    assert_eq!(first_about, second_about);
}

#[tokio::test]
async fn test_non_html_page_saved_verbatim() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/files/report.pdf">Report</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/files/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .mount(&mock_server)
        .await;

    let report = run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    let index = read_string(output.path(), "index.html");
    assert!(index.contains(r#"href="files/report.pdf""#));
    assert_eq!(
        std::fs::read(output.path().join("files/report.pdf")).unwrap(),
        b"%PDF-1.4"
    );
    assert_eq!(report.pages_saved, 1);
    assert_eq!(report.assets_saved, 1);
}

#[tokio::test]
async fn test_stylesheet_references_rewritten() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><link rel="stylesheet" href="/css/site.css"></head><body></body></html>"#,
            "text/html",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/css/site.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "body { background: url(/img/bg.png); } .cdn { background: url(https://cdn.other.com/x.png); }",
            "text/css",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/bg.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![9u8, 9, 9], "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    let index = read_string(output.path(), "index.html");
    assert!(index.contains(r#"href="css/site.css""#));

    let css = read_string(output.path(), "css/site.css");
    assert!(css.contains("url('../img/bg.png')"));
    assert!(css.contains("url(https://cdn.other.com/x.png)"));
    assert!(output.path().join("img/bg.png").exists());

    assert_eq!(report.assets_saved, 2);
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_bookmark_button_and_viewer() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(&mock_server, "/", "<p>Hello</p>").await;

    run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    let index = read_string(output.path(), "index.html");
    assert!(index.contains("/api/add_bookmark"));

    let viewer = read_string(output.path(), "_bookmarks.html");
    assert!(viewer.contains("/api/bookmarks"));
}

#[tokio::test]
async fn test_bookmark_button_can_be_disabled() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(&mock_server, "/", "<p>Hello</p>").await;

    let mut config = create_test_config();
    config.archive.inject_bookmark_button = false;
    run_archive(config, &mock_server.uri(), output.path())
        .await
        .unwrap();

    let index = read_string(output.path(), "index.html");
    assert!(!index.contains("/api/add_bookmark"));
    assert!(output.path().join("_bookmarks.html").exists());
}

#[tokio::test]
async fn test_same_site_redirect() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/old">Old</a><a href="/new/">New</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new/"))
        .respond_with(html_page(r#"<img src="pic.png">"#))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new/pic.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![5u8], "image/png"))
        .mount(&mock_server)
        .await;

    let report = run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    // Relative references resolve against the redirect target
    let old = read_string(output.path(), "old/index.html");
    assert!(old.contains(r#"src="../new/pic.png""#));
    let new = read_string(output.path(), "new/index.html");
    assert!(new.contains(r#"src="pic.png""#));

    assert_eq!(report.pages_visited, 2);
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_query_pages_do_not_collide() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/search?q=a">A</a><a href="/search?q=b">B</a>"#,
    )
    .await;
    mount_page(&mock_server, "/search", "<p>results</p>").await;

    let report = run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    assert_eq!(report.pages_saved, 3);
    let saved: Vec<_> = std::fs::read_dir(output.path().join("search"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(saved.len(), 2);
    assert!(saved.iter().all(|name| name.starts_with("index-") && name.ends_with(".html")));
}

#[tokio::test]
async fn test_page_budget_stops_crawl() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&mock_server, "/a", "<p>a</p>").await;
    mount_page(&mock_server, "/b", "<p>b</p>").await;

    let mut config = create_test_config();
    config.crawler.max_pages = 2;
    let report = run_archive(config, &mock_server.uri(), output.path())
        .await
        .unwrap();

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.pages_remaining, 1);
    assert!(output.path().join("_bookmarks.html").exists());
}

#[tokio::test]
async fn test_latin1_page_is_rewritten_and_followed() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let mut body = b"<html><head><title>Caf".to_vec();
    body.push(0xE9);
    body.extend_from_slice(br#"</title></head><body><a href="/about">About</a><img src="/logo.png"></body></html>"#);
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=iso-8859-1"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_page("<p>about</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    let root = output.path();
    let index = std::fs::read(root.join("index.html")).unwrap();
    // Saved in its own encoding, so the declared charset still applies
    assert!(index.windows(4).any(|w| w == b"Caf\xe9"));
    let index = String::from_utf8_lossy(&index);
    assert!(index.contains(r#"href="about/index.html""#));
    assert!(index.contains(r#"src="logo.png""#));
    assert!(root.join("about/index.html").exists());

    assert_eq!(report.pages_saved, 2);
    assert_eq!(report.assets_saved, 1);
    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
}

#[tokio::test]
async fn test_invalid_utf8_page_is_still_followed() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let mut body = br#"<html><body><a href="/next">Next</a><p>"#.to_vec();
    body.push(0xFF);
    body.extend_from_slice(b"</p></body></html>");
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html_page("<p>next</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    let index = read_string(output.path(), "index.html");
    assert!(index.contains(r#"href="next/index.html""#));
    assert_eq!(report.pages_saved, 2);
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.errors[0].kind, ErrorKind::Parse);
}

#[tokio::test]
async fn test_asset_also_linked_is_fetched_once() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/big.jpg"><img src="/big.jpg"></a>"#).await;

    Mock::given(method("GET"))
        .and(path("/big.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![255u8, 216, 255], "image/jpeg"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    let index = read_string(output.path(), "index.html");
    assert!(index.contains(r#"<a href="big.jpg"><img src="big.jpg"></a>"#));
    assert_eq!(std::fs::read(output.path().join("big.jpg")).unwrap(), vec![255u8, 216, 255]);

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.assets_saved, 1);
    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
}

#[tokio::test]
async fn test_missing_resource_in_both_roles_counted_once() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/gone.jpg"><img src="/gone.jpg"></a>"#).await;

    Mock::given(method("GET"))
        .and(path("/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    let index = read_string(output.path(), "index.html");
    assert!(index.contains(r#"src="/gone.jpg""#));
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.errors[0].kind, ErrorKind::Fetch);
}

#[tokio::test]
async fn test_asset_linked_as_page_is_copied_to_page_path() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/photo?id=3">Photo</a><img src="/photo?id=3">"#).await;

    Mock::given(method("GET"))
        .and(path("/photo"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![71u8, 73, 70], "image/gif"))
        .expect(1)
        .mount(&mock_server)
        .await;

    run_archive(create_test_config(), &mock_server.uri(), output.path())
        .await
        .unwrap();

    let mapper = PathMapper::new("index.html", false);
    let photo = Url::parse(&format!("{}/photo?id=3", mock_server.uri())).unwrap();
    let as_asset = mapper.to_archive_path(&photo, PathRole::Asset);
    let as_page = mapper.to_archive_path(&photo, PathRole::Page);
    assert_ne!(as_asset, as_page);

    let root = output.path();
    assert_eq!(std::fs::read(root.join(as_asset.as_str())).unwrap(), vec![71u8, 73, 70]);
    assert_eq!(std::fs::read(root.join(as_page.as_str())).unwrap(), vec![71u8, 73, 70]);
}

#[tokio::test]
async fn test_invalid_seed_is_fatal() {
    let output = TempDir::new().unwrap();

    let result = run_archive(create_test_config(), "ftp://example.com/", output.path()).await;
    assert!(matches!(result, Err(ArchiveError::InvalidSeed { .. })));
}

#[test]
fn test_unwritable_root_is_fatal() {
    let output = TempDir::new().unwrap();
    let blocked = output.path().join("occupied");
    std::fs::write(&blocked, b"a file, not a directory").unwrap();

    let result = Coordinator::new(create_test_config(), "http://127.0.0.1:9/", &blocked);
    assert!(matches!(result, Err(ArchiveError::OutputRoot { .. })));
}
