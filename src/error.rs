//! Error types for scraping runs and CSV export.
//!
//! Only request-level problems surface as `ScrapeError`. A failed fetch for a
//! single URL is a `ProviderError`, which the orchestrator turns into a
//! fallback product plus a notice instead of aborting the run.

use thiserror::Error;

/// Request-level failures visible to the caller.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Every submitted URL was blank.
    #[error("No URLs provided. Please enter at least one AliExpress product URL.")]
    NoUrls,

    /// Export requested with an empty product list.
    #[error("No products to export. Please scrape some products first.")]
    NoProducts,

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the external scraping provider for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("ScrapingBee API key not configured")]
    MissingCredentials,

    #[error("Scraping failed with status: {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}
