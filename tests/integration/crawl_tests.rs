//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end over real HTTP.

use spider_engine::config::{load_config, SpiderConfig};
use spider_engine::{Page, Spider, SpiderError, Traversal};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Pages and errors collected from a run
#[derive(Default)]
struct Collected {
    pages: Mutex<Vec<Page>>,
    errors: Mutex<Vec<(String, String)>>,
    timeouts: Mutex<usize>,
}

fn collecting_traversal(collected: &Arc<Collected>) -> Traversal {
    let pages = collected.clone();
    let errors = collected.clone();
    Traversal::new()
        .on_page(move |page| pages.pages.lock().unwrap().push(page))
        .on_error(move |url, error| {
            if matches!(error, SpiderError::Timeout { .. }) {
                *errors.timeouts.lock().unwrap() += 1;
            }
            errors
                .errors
                .lock()
                .unwrap()
                .push((url.to_string(), error.to_string()));
        })
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn seed(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).expect("Failed to build seed URL")
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="page1">Page 1 again</a>
            </body></html>"#,
            base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html_response(
            r#"<html><head><title>Page 1</title></head><body><a href="/">Home</a></body></html>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html_response(
            r#"<html><head><title>Page 2</title></head><body><a href="/page1">1</a></body></html>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let collected = Arc::new(Collected::default());
    let spider = Spider::new(&SpiderConfig::default(), collecting_traversal(&collected))
        .expect("Failed to create spider");

    spider
        .run_to_end(seed(&mock_server, "/"))
        .await
        .expect("Crawl failed");

    let mut titles: Vec<String> = collected
        .pages
        .lock()
        .unwrap()
        .iter()
        .map(|page| page.title().to_string())
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Home", "Page 1", "Page 2"]);

    assert_eq!(spider.progress().created(), 3);
    assert_eq!(spider.progress().completed(), 3);
    assert_eq!(spider.progress().outstanding(), 0);
    assert!(collected.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_http_errors_are_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(
            r#"<a href="/gone">Gone</a><a href="/broken">Broken</a><a href="/fine">Fine</a>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"<a href="/hidden">x</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fine"))
        .respond_with(html_response("<title>Fine</title>".to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html_response(String::new()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let collected = Arc::new(Collected::default());
    let spider = Spider::new(&SpiderConfig::default(), collecting_traversal(&collected))
        .expect("Failed to create spider");

    spider
        .run_to_end(seed(&mock_server, "/"))
        .await
        .expect("Crawl failed");

    assert_eq!(collected.pages.lock().unwrap().len(), 2);

    let mut errors = collected.errors.lock().unwrap().clone();
    errors.sort();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].0.ends_with("/broken"));
    assert!(errors[0].1.contains("500"));
    assert!(errors[1].0.ends_with("/gone"));
    assert!(errors[1].1.contains("404"));

    assert_eq!(spider.progress().created(), 4);
    assert_eq!(spider.progress().outstanding(), 0);
}

#[tokio::test]
async fn test_meta_charset_without_header() {
    let mock_server = MockServer::start().await;

    let html = r#"<html><head><meta charset="windows-1251"><title>Заголовок</title></head></html>"#;
    let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(html);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(bytes.into_owned(), "text/html"),
        )
        .mount(&mock_server)
        .await;

    let collected = Arc::new(Collected::default());
    let spider = Spider::new(&SpiderConfig::default(), collecting_traversal(&collected))
        .expect("Failed to create spider");

    spider
        .run_to_end(seed(&mock_server, "/"))
        .await
        .expect("Crawl failed");

    let pages = collected.pages.lock().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].html(), html);
    assert_eq!(pages[0].title(), "Заголовок");
}

#[tokio::test]
async fn test_default_headers_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("x-spider-test", "yes"))
        .respond_with(html_response("<title>Allowed</title>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = SpiderConfig::default()
        .with_header("X-Spider-Test", "yes")
        .expect("Invalid header");

    let collected = Arc::new(Collected::default());
    let spider =
        Spider::new(&config, collecting_traversal(&collected)).expect("Failed to create spider");

    spider
        .run_to_end(seed(&mock_server, "/"))
        .await
        .expect("Crawl failed");

    assert_eq!(collected.pages.lock().unwrap().len(), 1);
    assert!(collected.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_request_timeout_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            html_response("<title>Slow</title>".to_string()).set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let config = SpiderConfig::default().with_timeout(Duration::from_millis(200));
    let collected = Arc::new(Collected::default());
    let spider =
        Spider::new(&config, collecting_traversal(&collected)).expect("Failed to create spider");

    spider
        .run_to_end(seed(&mock_server, "/"))
        .await
        .expect("Crawl failed");

    assert!(collected.pages.lock().unwrap().is_empty());
    assert_eq!(*collected.timeouts.lock().unwrap(), 1);
    assert_eq!(spider.progress().completed(), 1);
    assert_eq!(spider.progress().outstanding(), 0);
}

#[tokio::test]
async fn test_cancellation_over_http() {
    let mock_server = MockServer::start().await;

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/slow/{}">{}</a>"#, i, i))
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(links))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(
            html_response("<title>Slow</title>".to_string()).set_delay(Duration::from_secs(30)),
        )
        .mount(&mock_server)
        .await;

    let collected = Arc::new(Collected::default());
    let spider = Spider::new(&SpiderConfig::default(), collecting_traversal(&collected))
        .expect("Failed to create spider");

    let token = tokio_util::sync::CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        canceller.cancel();
    });

    tokio::time::timeout(
        Duration::from_secs(5),
        spider.run(seed(&mock_server, "/"), token),
    )
    .await
    .expect("Run did not return after cancellation")
    .expect("Crawl failed");

    assert_eq!(spider.progress().created(), 11);
    assert_eq!(spider.progress().outstanding(), 0);
    assert_eq!(collected.pages.lock().unwrap().len(), 1);
    assert_eq!(collected.errors.lock().unwrap().len(), 10);
}

#[tokio::test]
async fn test_spider_from_config_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "ConfiguredSpider/2.0"))
        .respond_with(html_response("<title>Configured</title>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[spider]
timeout-secs = 10
connection-limit = 4

[headers]
user-agent = "ConfiguredSpider/2.0"
"#,
    )
    .unwrap();
    file.flush().unwrap();

    let config = load_config(file.path()).expect("Failed to load config");
    assert_eq!(config.connection_limit, 4);

    let collected = Arc::new(Collected::default());
    let spider =
        Spider::new(&config, collecting_traversal(&collected)).expect("Failed to create spider");

    spider
        .run_to_end(seed(&mock_server, "/"))
        .await
        .expect("Crawl failed");

    let pages = collected.pages.lock().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].title(), "Configured");
}
