//! ali-shopify - AliExpress product scraper with Shopify CSV export

use ali_shopify::commands::{CancelFlag, ConsoleSink, ExtractCommand, RunState, ScrapeCommand};
use ali_shopify::config::{Config, OutputFormat};
use ali_shopify::export::{self, DEFAULT_EXPORT_FILE, SHOPIFY_HEADERS};
use ali_shopify::format::Formatter;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ali-shopify",
    version,
    about = "Scrape AliExpress products into a Shopify import CSV",
    long_about = "Fetches AliExpress product pages through ScrapingBee, extracts the product fields, and exports them in Shopify's bulk product import format."
)]
struct Cli {
    /// ScrapingBee API key
    #[arg(long, global = true, env = "SCRAPINGBEE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "ALI_PROXY")]
    proxy: Option<String>,

    /// Delay between requests in milliseconds
    #[arg(long, global = true)]
    delay: Option<u64>,

    /// Number of pages fetched at once
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (table, json, markdown, csv)
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape product URLs
    #[command(alias = "s")]
    Scrape {
        /// AliExpress product URLs
        urls: Vec<String>,

        /// Read additional URLs from a file, one per line
        #[arg(long)]
        file: Option<PathBuf>,

        /// Write a Shopify import CSV (default: shopify-products-import.csv)
        #[arg(
            long,
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = DEFAULT_EXPORT_FILE
        )]
        export: Option<PathBuf>,
    },

    /// Extract a product from a saved page
    #[command(alias = "x")]
    Extract {
        /// Saved HTML page (or provider JSON response)
        page: PathBuf,

        /// URL the page was fetched from
        #[arg(long)]
        url: String,
    },

    /// List the CSV export columns
    Columns,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(key) = cli.api_key {
        config.api_key = Some(key);
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency.max(1);
    }
    if let Some(format) = cli.format {
        config.format = format;
    }

    match cli.command {
        Commands::Scrape { mut urls, file, export } => {
            if let Some(path) = file {
                urls.extend(read_url_file(&path)?);
            }

            let format = config.format;
            let cancel = CancelFlag::new();
            let flag = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("Stopping after the current product...");
                    flag.cancel();
                }
            });

            let cmd = ScrapeCommand::new(config).with_cancel(cancel);
            let run = cmd.execute(&urls, &ConsoleSink).await?;

            println!("{}", Formatter::new(format).format_products(&run.products));

            if let Some(path) = export {
                export::write_csv(&path, &run.products)
                    .with_context(|| format!("Failed to export {}", path.display()))?;
                eprintln!(
                    "Export successful! Wrote {} products to {}",
                    run.count(),
                    path.display()
                );
            }

            if run.state == RunState::Cancelled {
                std::process::exit(130);
            }
        }

        Commands::Extract { page, url } => {
            let cmd = ExtractCommand::new(config);
            let output = cmd.execute(&page, &url)?;
            println!("{}", output);
        }

        Commands::Columns => {
            for (index, header) in SHOPIFY_HEADERS.iter().enumerate() {
                println!("{:>2}  {}", index + 1, header);
            }
        }
    }

    Ok(())
}

/// Reads URLs from a file, skipping blank lines and `#` comments.
fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read URL file: {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}
