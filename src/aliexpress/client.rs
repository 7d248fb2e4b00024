//! HTTP client for the ScrapingBee rendering proxy using wreq.

use crate::config::Config;
use crate::error::ProviderError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;

/// Production endpoint of the scraping provider.
pub const SCRAPINGBEE_BASE_URL: &str = "https://app.scrapingbee.com";

/// Trait for fetching product pages - enables mocking for tests.
#[async_trait]
pub trait ProductFetcher: Send + Sync {
    /// Fetches the rendered page (or extraction JSON) for a product URL.
    async fn fetch_html(&self, url: &str) -> Result<String, ProviderError>;
}

/// ScrapingBee client with courtesy delay between requests.
pub struct ScrapingBeeClient {
    client: Client,
    api_key: Option<String>,
    render_js: bool,
    premium_proxy: bool,
    delay_ms: u64,
    delay_jitter_ms: u64,
    base_url: Option<String>,
}

impl ScrapingBeeClient {
    /// Creates a new client with the given configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, None).await
    }

    /// Creates a new client with an optional custom base URL (for testing).
    pub async fn with_base_url(config: &Config, base_url: Option<String>) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        let api_key = config.api_key.clone().filter(|_| config.has_api_key());
        if api_key.is_none() {
            warn!("No ScrapingBee API key configured; every URL will use the fallback product");
        }

        Ok(Self {
            client,
            api_key,
            render_js: config.render_js,
            premium_proxy: config.premium_proxy,
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
            base_url,
        })
    }

    /// Returns the base URL (custom for testing, or the provider's for production).
    fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(SCRAPINGBEE_BASE_URL)
    }

    /// Builds the provider request URL for a product page.
    fn request_url(&self, api_key: &str, target: &str) -> String {
        format!(
            "{}/api/v1/?api_key={}&url={}&render_js={}&premium_proxy={}",
            self.base_url(),
            urlencoding::encode(api_key),
            urlencoding::encode(target),
            self.render_js,
            self.premium_proxy
        )
    }

    /// Adds a random delay so consecutive requests are spaced out.
    async fn delay(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter =
            if self.delay_jitter_ms > 0 { rand::random_range(0..=self.delay_jitter_ms) } else { 0 };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

#[async_trait]
impl ProductFetcher for ScrapingBeeClient {
    async fn fetch_html(&self, url: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingCredentials)?;

        self.delay().await;

        info!("Scraping product from URL: {}", url);

        let response = self
            .client
            .get(self.request_url(api_key, url))
            .header("Accept", "text/html")
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            warn!("ScrapingBee API error for {}: {}", url, status);
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| ProviderError::Body(e.to_string()))?;
        debug!("Scraped content length: {}", body.len());

        Ok(body)
    }
}
