//! Offline extraction from a saved product page.

use crate::aliexpress::{IdGenerator, Parser, Product};
use crate::config::Config;
use crate::format::Formatter;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Runs the field extractor over a local HTML (or provider JSON) file.
pub struct ExtractCommand {
    config: Config,
    parser: Parser,
    ids: IdGenerator,
}

impl ExtractCommand {
    /// Creates a new extract command.
    pub fn new(config: Config) -> Self {
        Self { config, parser: Parser::new(), ids: IdGenerator::new() }
    }

    /// Reads `path` and returns the formatted product.
    pub fn execute(&self, path: impl AsRef<Path>, source_url: &str) -> Result<String> {
        let product = self.extract_file(path, source_url)?;
        Ok(Formatter::new(self.config.format).format_product(&product))
    }

    /// Reads `path` and extracts a product as if it had been fetched from `source_url`.
    pub fn extract_file(&self, path: impl AsRef<Path>, source_url: &str) -> Result<Product> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page file: {}", path.display()))?;

        info!("Extracting product from {} ({} bytes)", path.display(), body.len());

        Ok(self.parser.parse_product(&body, source_url, self.ids.next_id()))
    }
}
