//! ali-shopify - AliExpress product scraper with Shopify CSV export
//!
//! Fetches product pages through the ScrapingBee rendering proxy, extracts
//! a fixed set of fields from each page, and writes the results as a
//! Shopify bulk-import CSV.

pub mod aliexpress;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod format;

pub use aliexpress::{extract, IdGenerator, Parser, Product, ProductFetcher, ScrapingBeeClient};
pub use commands::{CancelFlag, EventSink, RunState, ScrapeCommand, ScrapeEvent, ScrapeRun};
pub use config::Config;
pub use error::{ProviderError, ScrapeError};
pub use export::{to_csv, write_csv};
