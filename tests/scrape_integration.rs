//! End-to-end scrape runs against a mocked ScrapingBee endpoint.

use ali_shopify::aliexpress::ScrapingBeeClient;
use ali_shopify::commands::{CancelFlag, NullSink, RunState, ScrapeCommand, ScrapeEvent};
use ali_shopify::config::Config;
use ali_shopify::error::ScrapeError;
use ali_shopify::export;
use std::sync::Mutex;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCT_FIXTURE: &str = include_str!("fixtures/product_page.html");
const URL_OK: &str = "https://www.aliexpress.com/item/1005006172394821.html";
const URL_FAIL: &str = "https://www.aliexpress.us/item/3256805.html";

fn make_test_config() -> Config {
    Config {
        api_key: Some("integration-key".to_string()),
        delay_ms: 0,
        delay_jitter_ms: 0,
        ..Config::default()
    }
}

async fn mock_provider() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/"))
        .and(query_param("url", URL_OK))
        .and(query_param("api_key", "integration-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_FIXTURE))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/"))
        .and(query_param("url", URL_FAIL))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_scrape_with_fallback_and_export() {
    let server = mock_provider().await;
    let config = make_test_config();
    let client = ScrapingBeeClient::with_base_url(&config, Some(server.uri())).await.unwrap();

    let events = Mutex::new(Vec::new());
    let sink = |event: &ScrapeEvent| events.lock().unwrap().push(event.clone());

    let urls = vec![URL_FAIL.to_string(), "   ".to_string(), URL_OK.to_string()];
    let run = ScrapeCommand::new(config).execute_with_client(&client, &urls, &sink).await.unwrap();

    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.count(), 2);
    assert_eq!(run.failures, 1);

    // Failed URL keeps its position with a host-derived product
    assert_eq!(run.products[0].url, URL_FAIL);
    assert_eq!(run.products[0].title, "Product from www.aliexpress.us");
    assert_eq!(
        run.products[1].title,
        "Wireless Bluetooth Earbuds TWS 5.3 Noise Cancelling Headphones"
    );
    assert_eq!(run.products[1].price, "$24.99");

    let fractions: Vec<f64> =
        events.lock().unwrap().iter().filter_map(ScrapeEvent::fraction).collect();
    assert_eq!(fractions, vec![0.5, 1.0]);

    let bytes = export::to_csv(&run.products).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.contains("\"product-from-www-aliexpress-us\""));
    assert!(text.contains("\"24.99\""));
}

#[tokio::test]
async fn test_scrape_without_api_key_falls_back() {
    let server = MockServer::start().await;
    let config = Config { api_key: None, ..make_test_config() };
    let client = ScrapingBeeClient::with_base_url(&config, Some(server.uri())).await.unwrap();

    let urls = vec![URL_OK.to_string()];
    let run =
        ScrapeCommand::new(config).execute_with_client(&client, &urls, &NullSink).await.unwrap();

    assert_eq!(run.failures, 1);
    assert_eq!(run.products[0].title, "Product from www.aliexpress.com");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scrape_no_urls_then_export_fails() {
    let server = MockServer::start().await;
    let config = make_test_config();
    let client = ScrapingBeeClient::with_base_url(&config, Some(server.uri())).await.unwrap();

    let urls = vec![String::new(), " \t ".to_string()];
    let err = ScrapeCommand::new(config)
        .execute_with_client(&client, &urls, &NullSink)
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::NoUrls));
    assert!(server.received_requests().await.unwrap().is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(export::DEFAULT_EXPORT_FILE);
    assert!(matches!(export::write_csv(&path, &[]), Err(ScrapeError::NoProducts)));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_stale_cancel_does_not_block_new_run() {
    let server = mock_provider().await;
    let config = make_test_config();
    let client = ScrapingBeeClient::with_base_url(&config, Some(server.uri())).await.unwrap();

    let cancel = CancelFlag::new();
    cancel.cancel();

    let urls = vec![URL_OK.to_string()];
    let run = ScrapeCommand::new(config)
        .with_cancel(cancel)
        .execute_with_client(&client, &urls, &NullSink)
        .await
        .unwrap();

    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.count(), 1);
    assert_eq!(run.products[0].price, "$24.99");
}
