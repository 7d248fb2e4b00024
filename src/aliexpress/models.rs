//! Data model for scraped products.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

/// Title used when neither `<title>` nor `og:title` yields text.
pub const DEFAULT_TITLE: &str = "Product Title Not Found";

/// Price used when no price token is found.
pub const DEFAULT_PRICE: &str = "$0.00";

/// Image shown for products without a usable image.
pub const PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1526170375885-4d8ecf77b99f?w=300&h=300&fit=crop";

/// Prefix of the description used when the page has none.
pub const DEFAULT_DESCRIPTION_PREFIX: &str = "Scraped from: ";

pub const DEFAULT_RATING: &str = "0.0";
pub const DEFAULT_REVIEWS: &str = "0";
pub const DEFAULT_VARIANT: &str = "Default";

/// Descriptions are cut to this many characters.
pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// A product extracted from one input URL.
///
/// Every field always holds a value: extraction misses fall back to the
/// defaults above, so constructing a `Product` never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Session-unique identifier
    pub id: String,
    /// Product title, never empty
    pub title: String,
    /// Current price, `$`-prefixed
    pub price: String,
    /// Price before discount, when one was reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<String>,
    /// Absolute https image URL
    pub image_url: String,
    /// Meta description, at most `DESCRIPTION_MAX_CHARS` characters
    pub description: String,
    /// Input URL, verbatim
    pub url: String,
    /// Star rating in `0.0..=5.0` textual form
    pub rating: String,
    /// Review count
    pub reviews: String,
    /// Variant names, never empty
    pub variants: Vec<String>,
}

impl Product {
    /// Creates a product for `url` with every field at its default.
    pub fn with_defaults(id: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: id.into(),
            title: DEFAULT_TITLE.to_string(),
            price: DEFAULT_PRICE.to_string(),
            original_price: None,
            image_url: PLACEHOLDER_IMAGE.to_string(),
            description: format!("{}{}", DEFAULT_DESCRIPTION_PREFIX, url),
            url,
            rating: DEFAULT_RATING.to_string(),
            reviews: DEFAULT_REVIEWS.to_string(),
            variants: vec![DEFAULT_VARIANT.to_string()],
        }
    }

    /// Builds the degraded product used when the page could not be fetched.
    ///
    /// Only the URL is known, so the title names the host and the
    /// description embeds the raw URL.
    pub fn fallback(id: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let host = host_of(&url).unwrap_or_else(|| url.trim().to_string());

        Self {
            title: format!("Product from {}", host),
            description: format!("Product URL: {}", url),
            ..Self::with_defaults(id, url)
        }
    }

    /// Returns the current price as a number, if it parses.
    pub fn price_value(&self) -> Option<f64> {
        parse_amount(&self.price)
    }

    /// Returns the original price as a number, if present.
    pub fn original_price_value(&self) -> Option<f64> {
        self.original_price.as_deref().and_then(parse_amount)
    }

    /// Returns discount percentage if on sale.
    pub fn discount_percent(&self) -> Option<u8> {
        let current = self.price_value()?;
        let original = self.original_price_value()?;
        if original <= 0.0 || current >= original {
            return None;
        }
        let discount = ((original - current) / original * 100.0).round() as u8;
        Some(discount.min(99))
    }
}

/// Returns the host of `url`, accepting scheme-less input like `aliexpress.com/item/1`.
pub fn host_of(url: &str) -> Option<String> {
    let url = url.trim();
    let parsed = Url::parse(url).or_else(|_| Url::parse(&format!("https://{}", url))).ok()?;
    parsed.host_str().filter(|h| !h.is_empty()).map(String::from)
}

fn parse_amount(text: &str) -> Option<f64> {
    text.trim().trim_start_matches('$').replace(',', "").parse().ok()
}

/// Hands out product identifiers that are unique within one session.
///
/// IDs are a random session prefix followed by a monotonic counter, e.g.
/// `k3x9qa-0001`.
#[derive(Debug)]
pub struct IdGenerator {
    session: String,
    counter: AtomicU64,
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

impl IdGenerator {
    /// Creates a generator with a random six character session prefix.
    pub fn new() -> Self {
        let session = (0..6)
            .map(|_| ID_ALPHABET[rand::random_range(0..ID_ALPHABET.len())] as char)
            .collect::<String>();
        Self::with_session(session)
    }

    /// Creates a generator with a fixed session prefix.
    pub fn with_session(session: impl Into<String>) -> Self {
        Self { session: session.into(), counter: AtomicU64::new(0) }
    }

    /// Returns the next identifier.
    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{:04}", self.session, n)
    }

    pub fn session(&self) -> &str {
        &self.session
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
