//! Scrape command: fetch and extract a list of product URLs.
//!
//! URLs are processed in input order. With `concurrency = 1` (the default)
//! only one fetch is in flight at a time; larger values keep up to that many
//! fetches running but still yield products and progress in input order.

use crate::aliexpress::{IdGenerator, Parser, Product, ProductFetcher, ScrapingBeeClient};
use crate::config::Config;
use crate::error::ScrapeError;
use anyhow::{Context, Result};
use futures::{stream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Lifecycle of a scrape command: `Idle` until the first run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// Events reported to the caller while a run progresses.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeEvent {
    /// Validation passed; `total` URLs will be processed.
    Started { total: usize },
    /// One more URL finished.
    Progress { completed: usize, total: usize },
    /// Something the user should see; never fatal.
    Notice { kind: NoticeKind, url: Option<String>, message: String },
    /// Every URL was processed.
    Completed { count: usize },
    /// The run stopped early; partial results are kept.
    Cancelled { completed: usize, total: usize },
}

impl ScrapeEvent {
    /// Fraction complete for progress events.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            ScrapeEvent::Progress { completed, total } if *total > 0 => {
                Some(*completed as f64 / *total as f64)
            }
            _ => None,
        }
    }
}

/// Receiver for run events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ScrapeEvent);
}

impl<F> EventSink for F
where
    F: Fn(&ScrapeEvent) + Send + Sync,
{
    fn emit(&self, event: &ScrapeEvent) {
        self(event)
    }
}

/// Discards every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &ScrapeEvent) {}
}

/// Prints progress and notices to stderr for interactive use.
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: &ScrapeEvent) {
        match event {
            ScrapeEvent::Started { total } => eprintln!("Scraping {} product(s)...", total),
            ScrapeEvent::Progress { completed, total } => {
                let percent = event.fraction().unwrap_or(0.0) * 100.0;
                eprintln!("[{}/{}] {:.0}%", completed, total, percent);
            }
            ScrapeEvent::Notice { kind, message, .. } => match kind {
                NoticeKind::Info => eprintln!("{}", message),
                NoticeKind::Warning => eprintln!("warning: {}", message),
                // Also returned as the run's error
                NoticeKind::Error => {}
            },
            ScrapeEvent::Completed { count } => {
                eprintln!("Scraping completed! Successfully scraped {} products", count)
            }
            ScrapeEvent::Cancelled { completed, total } => {
                eprintln!("Scraping cancelled after {}/{} products", completed, total)
            }
        }
    }
}

/// Shared flag for stopping a run between URLs.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears a previous cancellation.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Result of one scrape run.
#[derive(Debug, Clone)]
pub struct ScrapeRun {
    /// Products in input URL order
    pub products: Vec<Product>,
    /// Terminal state (`Completed` or `Cancelled`)
    pub state: RunState,
    /// URLs that fell back to a URL-only product
    pub failures: usize,
}

impl ScrapeRun {
    /// Returns number of products.
    pub fn count(&self) -> usize {
        self.products.len()
    }

    /// Returns true if no products were produced.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Drops blank and whitespace-only entries, keeping the rest verbatim.
pub fn valid_urls(urls: &[String]) -> Vec<&str> {
    urls.iter().map(String::as_str).filter(|u| !u.trim().is_empty()).collect()
}

/// Executes a scrape run over a list of product URLs.
pub struct ScrapeCommand {
    config: Config,
    parser: Parser,
    ids: IdGenerator,
    cancel: CancelFlag,
    state: Mutex<RunState>,
}

impl ScrapeCommand {
    /// Creates a new scrape command.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            parser: Parser::new(),
            ids: IdGenerator::new(),
            cancel: CancelFlag::new(),
            state: Mutex::new(RunState::Idle),
        }
    }

    /// Uses an externally owned cancel flag.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Uses a fixed ID generator (for deterministic output).
    pub fn with_ids(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Returns a handle that cancels the run in progress.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Returns the state of the current (or last) run.
    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, to: RunState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        debug!("Run state {:?} -> {:?}", *state, to);
        *state = to;
    }

    /// Scrapes every URL through the configured provider.
    pub async fn execute(&self, urls: &[String], sink: &dyn EventSink) -> Result<ScrapeRun> {
        if valid_urls(urls).is_empty() {
            return Err(self.reject(sink).into());
        }

        let client =
            ScrapingBeeClient::new(&self.config).await.context("Failed to create HTTP client")?;

        Ok(self.execute_with_client(&client, urls, sink).await?)
    }

    /// Scrapes every URL with a provided fetcher (for testing).
    pub async fn execute_with_client(
        &self,
        client: &impl ProductFetcher,
        urls: &[String],
        sink: &dyn EventSink,
    ) -> Result<ScrapeRun, ScrapeError> {
        let submitted = urls.len();
        let urls = valid_urls(urls);
        if urls.is_empty() {
            return Err(self.reject(sink));
        }

        let total = urls.len();
        self.cancel.reset();
        self.set_state(RunState::Running);
        info!("Starting product scraping for {} URLs", total);
        sink.emit(&ScrapeEvent::Started { total });

        let skipped = submitted - total;
        if skipped > 0 {
            sink.emit(&ScrapeEvent::Notice {
                kind: NoticeKind::Info,
                url: None,
                message: format!("Skipped {} blank entries", skipped),
            });
        }

        let mut products: Vec<Product> = Vec::with_capacity(total);
        let mut failures = 0;

        let mut results = stream::iter(urls.iter().enumerate())
            .map(|(index, url)| self.scrape_one(client, url, index, total, sink))
            .buffered(self.config.concurrency.max(1));

        while let Some(outcome) = results.next().await {
            let Some((product, failed)) = outcome else {
                break;
            };

            if failed {
                failures += 1;
            }
            products.push(product);
            sink.emit(&ScrapeEvent::Progress { completed: products.len(), total });

            if self.cancel.is_cancelled() && products.len() < total {
                break;
            }
        }

        let completed = products.len();
        let state = if completed < total {
            info!("Scraping cancelled after {}/{} URLs", completed, total);
            sink.emit(&ScrapeEvent::Cancelled { completed, total });
            RunState::Cancelled
        } else {
            info!("Scraped {} products ({} fell back to URL analysis)", completed, failures);
            sink.emit(&ScrapeEvent::Completed { count: completed });
            RunState::Completed
        };
        self.set_state(state);

        Ok(ScrapeRun { products, state, failures })
    }

    /// Fetches and extracts one URL. Returns `None` if cancelled before fetching.
    async fn scrape_one(
        &self,
        client: &impl ProductFetcher,
        url: &str,
        index: usize,
        total: usize,
        sink: &dyn EventSink,
    ) -> Option<(Product, bool)> {
        if self.cancel.is_cancelled() {
            debug!("Skipping {} (run cancelled)", url);
            return None;
        }

        info!("Scraping product {}/{}: {}", index + 1, total, url);
        let id = self.ids.next_id();

        match client.fetch_html(url.trim()).await {
            Ok(body) => Some((self.parser.parse_product(&body, url, id), false)),
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                sink.emit(&ScrapeEvent::Notice {
                    kind: NoticeKind::Warning,
                    url: Some(url.to_string()),
                    message: format!(
                        "Scraping unavailable for {} ({}). Using URL analysis instead.",
                        url, e
                    ),
                });
                Some((Product::fallback(id, url), true))
            }
        }
    }

    fn reject(&self, sink: &dyn EventSink) -> ScrapeError {
        let err = ScrapeError::NoUrls;
        sink.emit(&ScrapeEvent::Notice {
            kind: NoticeKind::Error,
            url: None,
            message: err.to_string(),
        });
        err
    }
}
