//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variables holding the ScrapingBee API key, in lookup order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["SCRAPINGBEE_API_KEY", "SCRAPING_BEE_API_KEY"];

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// ScrapingBee API key; absent means every URL gets a fallback product
    #[serde(default)]
    pub api_key: Option<String>,

    /// Ask the provider to render JavaScript
    #[serde(default = "default_true")]
    pub render_js: bool,

    /// Ask the provider to use residential proxies
    #[serde(default = "default_true")]
    pub premium_proxy: bool,

    /// Outbound proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay before each request in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum fetches in flight; 1 scrapes strictly one URL at a time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_true() -> bool {
    true
}

fn default_delay_ms() -> u64 {
    1500
}

fn default_delay_jitter_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_concurrency() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            render_js: true,
            premium_proxy: true,
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Locations searched for a config file when none is given, in order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("ali-shopify").join("config.toml"));
        }
        paths
    }

    /// Loads the explicit file, else the first existing search path, else defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        match Self::search_paths().into_iter().find(|p| p.exists()) {
            Some(path) => Self::from_file(path),
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Some(key) = API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|v| !v.trim().is_empty())
        {
            self.api_key = Some(key);
        }

        if let Ok(proxy) = std::env::var("ALI_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("ALI_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        if let Ok(concurrency) = std::env::var("ALI_CONCURRENCY") {
            if let Ok(c) = concurrency.parse::<usize>() {
                if c > 0 {
                    self.concurrency = c;
                }
            }
        }

        self
    }

    /// Returns true if an API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api_key.is_none());
        assert!(config.render_js);
        assert!(config.premium_proxy);
        assert!(config.proxy.is_none());
        assert_eq!(config.delay_ms, 1500);
        assert_eq!(config.delay_jitter_ms, 500);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.format, OutputFormat::Table);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);

        let err = "xml".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
        assert!(err.contains("table, json, markdown, csv"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            api_key = "abc123"
            render_js = false
            delay_ms = 0
            concurrency = 4
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc123"));
        assert!(!config.render_js);
        assert!(config.premium_proxy);
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.delay_jitter_ms, 500);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.format, OutputFormat::Json);
        assert!(config.has_api_key());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            proxy = "socks5://localhost:1080"
            timeout_secs = 90
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.proxy.as_deref(), Some("socks5://localhost:1080"));
        assert_eq!(config.timeout_secs, 90);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "concurrency = 3").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn test_search_paths_start_with_working_dir() {
        let paths = Config::search_paths();
        assert_eq!(paths[0], PathBuf::from("config.toml"));
        assert!(paths.iter().skip(1).all(|p| p.ends_with("ali-shopify/config.toml")));
    }

    #[test]
    fn test_blank_api_key_not_usable() {
        let config = Config { api_key: Some("   ".to_string()), ..Config::default() };
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_config_with_env() {
        const VARS: [&str; 5] = [
            "SCRAPINGBEE_API_KEY",
            "SCRAPING_BEE_API_KEY",
            "ALI_PROXY",
            "ALI_DELAY",
            "ALI_CONCURRENCY",
        ];
        let saved: Vec<(&str, Option<String>)> =
            VARS.into_iter().map(|name| (name, std::env::var(name).ok())).collect();

        // Legacy variable is honoured when the primary one is unset
        std::env::remove_var("SCRAPINGBEE_API_KEY");
        std::env::set_var("SCRAPING_BEE_API_KEY", "legacy-key");
        std::env::set_var("ALI_PROXY", "http://proxy:8080");
        std::env::set_var("ALI_DELAY", "250");
        std::env::set_var("ALI_CONCURRENCY", "0");

        let config = Config::new().with_env();
        assert_eq!(config.api_key.as_deref(), Some("legacy-key"));
        assert_eq!(config.proxy.as_deref(), Some("http://proxy:8080"));
        assert_eq!(config.delay_ms, 250);
        assert_eq!(config.concurrency, 1);

        std::env::set_var("SCRAPINGBEE_API_KEY", "primary-key");
        std::env::set_var("ALI_DELAY", "not_a_number");
        std::env::set_var("ALI_CONCURRENCY", "3");

        let config = Config::new().with_env();
        assert_eq!(config.api_key.as_deref(), Some("primary-key"));
        assert_eq!(config.delay_ms, 1500);
        assert_eq!(config.concurrency, 3);

        for (name, value) in saved {
            match value {
                Some(v) => std::env::set_var(name, v),
                None => std::env::remove_var(name),
            }
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            api_key: Some("k".to_string()),
            concurrency: 2,
            format: OutputFormat::Markdown,
            ..Config::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.api_key, config.api_key);
        assert_eq!(parsed.concurrency, 2);
        assert_eq!(parsed.format, OutputFormat::Markdown);
    }
}
