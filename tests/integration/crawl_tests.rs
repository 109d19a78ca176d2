//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and a temporary
//! output directory to test the full crawl cycle end-to-end.

use std::path::Path;
use sumi_trawl::config::{Config, CrawlerConfig, MediaConfig, OutputConfig, UserAgentConfig};
use sumi_trawl::crawler::Coordinator;
use sumi_trawl::state::PageState;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3, 4];

/// Creates a test configuration writing into `output_dir`
fn create_test_config(max_depth: u32, output_dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth,
            traversal_workers: 4,
            request_timeout: 5,
            connect_timeout: 2,
        },
        media: MediaConfig {
            max_concurrent_downloads: 8,
            drain_timeout: 30,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            directory: output_dir.to_string_lossy().to_string(),
        },
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .expect(expected)
        .mount(server)
        .await;
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

async fn run(config: Config, seed: &str) -> sumi_trawl::CrawlStatistics {
    Coordinator::new(config, seed)
        .expect("Failed to create coordinator")
        .run()
        .await
}

#[tokio::test]
async fn test_page_with_image_and_child_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let out = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/A",
        format!(
            r#"<html><head><title>A</title></head><body>
            <p>Page A</p>
            <img src="/img/logo.png">
            <a href="{}/B">to B</a>
            </body></html>"#,
            base_url
        ),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/B",
        "<html><body><p>Page B</p></body></html>".to_string(),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/img/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(1, out.path());
    let stats = run(config, &format!("{}/A", base_url)).await;

    let a_text = std::fs::read_to_string(out.path().join("A.txt")).unwrap();
    assert!(a_text.contains("Page A"), "unexpected text: {}", a_text);
    assert!(!a_text.contains('<'));
    let b_text = std::fs::read_to_string(out.path().join("B.txt")).unwrap();
    assert_eq!(b_text, "Page B");

    assert_eq!(
        std::fs::read(out.path().join("logo.png.img")).unwrap(),
        PNG_BYTES
    );

    // Two page fetches and one media fetch
    assert_eq!(request_count(&mock_server).await, 3);

    assert_eq!(stats.pages_visited, 2);
    assert_eq!(stats.pages_in(PageState::Processed), 2);
    assert_eq!(stats.media.downloaded, 1);
    assert!(!stats.media.timed_out);

    // No staging files left behind
    let leftovers: Vec<_> = std::fs::read_dir(out.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_max_depth_is_respected() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let out = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/A",
        format!(r#"<html><body><a href="{}/B">B</a></body></html>"#, base_url),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/B",
        format!(r#"<html><body><a href="{}/C">C</a></body></html>"#, base_url),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/C",
        "<html><body>too deep</body></html>".to_string(),
        0,
    )
    .await;

    let config = create_test_config(1, out.path());
    let stats = run(config, &format!("{}/A", base_url)).await;

    assert!(out.path().join("A.txt").exists());
    assert!(out.path().join("B.txt").exists());
    assert!(!out.path().join("C.txt").exists());
    assert_eq!(stats.pages_visited, 2);
    assert_eq!(stats.depth_skipped, 1);
}

#[tokio::test]
async fn test_depth_zero_fetches_only_seed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let out = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        format!(r#"<html><body><a href="{}/next">next</a></body></html>"#, base_url),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/next",
        "<html><body>next</body></html>".to_string(),
        0,
    )
    .await;

    let config = create_test_config(0, out.path());
    let stats = run(config, &format!("{}/", base_url)).await;

    assert!(out.path().join("index.txt").exists());
    assert_eq!(stats.pages_visited, 1);
}

#[tokio::test]
async fn test_each_url_visited_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let out = TempDir::new().unwrap();

    // Duplicate links on the seed, and a cycle back to the seed from both children
    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><body>
            <a href="{0}/one">one</a>
            <a href="{0}/two">two</a>
            <a href="{0}/one">one again</a>
            <a href="/two">two again</a>
            </body></html>"#,
            base_url
        ),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/one",
        format!(
            r#"<html><body><a href="{0}/">home</a><a href="{0}/two">two</a></body></html>"#,
            base_url
        ),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/two",
        format!(
            r#"<html><body><a href="{0}/">home</a><a href="{0}/one">one</a></body></html>"#,
            base_url
        ),
        1,
    )
    .await;

    let config = create_test_config(5, out.path());
    let stats = run(config, &format!("{}/", base_url)).await;

    assert_eq!(stats.pages_visited, 3);
    assert_eq!(request_count(&mock_server).await, 3);
    assert!(stats.duplicate_links >= 4);
}

#[tokio::test]
async fn test_failed_sibling_does_not_stop_others() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let out = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><body>
            <a href="{0}/missing">missing</a>
            <a href="{0}/broken">broken</a>
            <a href="{0}/binary">binary</a>
            <a href="{0}/good">good</a>
            </body></html>"#,
            base_url
        ),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/binary"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/good",
        "<html><body>good content</body></html>".to_string(),
        1,
    )
    .await;

    let config = create_test_config(1, out.path());
    let stats = run(config, &format!("{}/", base_url)).await;

    assert_eq!(
        std::fs::read_to_string(out.path().join("good.txt")).unwrap(),
        "good content"
    );
    assert!(!out.path().join("missing.txt").exists());
    assert!(!out.path().join("broken.txt").exists());
    assert!(!out.path().join("binary.txt").exists());

    assert_eq!(stats.pages_visited, 5);
    assert_eq!(stats.pages_in(PageState::Processed), 2);
    assert_eq!(stats.pages_in(PageState::DeadLink), 1);
    assert_eq!(stats.pages_in(PageState::Failed), 1);
    assert_eq!(stats.pages_in(PageState::ContentMismatch), 1);
}

#[tokio::test]
async fn test_failed_media_does_not_stop_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let out = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<html><body>
        <img src="/img/gone.png">
        <img src="/img/ok.png">
        <video><source src="/media/clip.mp4"></video>
        </body></html>"#
            .to_string(),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/img/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/ok.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not really a video".to_vec()))
        .mount(&mock_server)
        .await;

    let config = create_test_config(0, out.path());
    let stats = run(config, &format!("{}/", base_url)).await;

    assert!(out.path().join("index.txt").exists());
    assert!(!out.path().join("gone.png.img").exists());
    assert!(out.path().join("ok.png.img").exists());
    assert_eq!(
        std::fs::read(out.path().join("clip.mp4.video")).unwrap(),
        b"not really a video"
    );
    assert_eq!(stats.media_dispatched, 3);
    assert_eq!(stats.media.downloaded, 2);
    assert_eq!(stats.media.failed, 1);
}

#[tokio::test]
async fn test_rerun_skips_media_and_overwrites_text() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/A"))
        .respond_with(html(
            r#"<html><body><p>Fresh text</p><img src="/img/logo.png"></body></html>"#.to_string(),
        ))
        .expect(2)
        .mount(&mock_server)
        .await;

    // Only the first run may download the image
    Mock::given(method("GET"))
        .and(path("/img/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES))
        .expect(1)
        .mount(&mock_server)
        .await;

    let seed = format!("{}/A", base_url);

    let first = run(create_test_config(0, out.path()), &seed).await;
    assert_eq!(first.media.downloaded, 1);

    let image_path = out.path().join("logo.png.img");
    let modified_before = std::fs::metadata(&image_path).unwrap().modified().unwrap();

    std::fs::write(out.path().join("A.txt"), "stale").unwrap();

    let second = run(create_test_config(0, out.path()), &seed).await;
    assert_eq!(second.media.downloaded, 0);
    assert_eq!(second.media.skipped, 1);

    assert_eq!(std::fs::read(&image_path).unwrap(), PNG_BYTES);
    assert_eq!(
        std::fs::metadata(&image_path).unwrap().modified().unwrap(),
        modified_before
    );
    assert_eq!(
        std::fs::read_to_string(out.path().join("A.txt")).unwrap(),
        "Fresh text"
    );
}

#[tokio::test]
async fn test_startup_failure_on_bad_seed() {
    let out = TempDir::new().unwrap();
    let config = create_test_config(0, out.path());

    assert!(Coordinator::new(config.clone(), "ftp://example.com/").is_err());
    assert!(Coordinator::new(config, "not a url").is_err());
}
