//! Field extraction for AliExpress product pages.
//!
//! Page markup varies by locale, template and render path, so every field is
//! resolved by an ordered cascade of independent patterns. A miss falls
//! through to the next pattern and finally to the field default; extraction
//! never fails.

use crate::aliexpress::models::{IdGenerator, Product, DESCRIPTION_MAX_CHARS};
use crate::aliexpress::selectors::{blocked, meta, text};
use scraper::Html;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, trace, warn};
use url::Url;

/// Suffix AliExpress appends to `<title>`.
pub const DEFAULT_TITLE_SUFFIX: &str = " - AliExpress";

/// Substring identifying product images on the AliExpress CDN.
pub const DEFAULT_CDN_MARKER: &str = "alicdn";

static SESSION_IDS: LazyLock<IdGenerator> = LazyLock::new(IdGenerator::new);

/// Extracts a product from a provider response using the default site profile.
///
/// IDs come from a process-wide generator.
pub fn extract(body: &str, source_url: &str) -> Product {
    Parser::new().parse_product(body, source_url, SESSION_IDS.next_id())
}

/// Parser for product pages and provider extraction responses.
#[derive(Debug, Clone)]
pub struct Parser {
    title_suffix: String,
    cdn_marker: String,
}

impl Parser {
    /// Creates a parser for AliExpress pages.
    pub fn new() -> Self {
        Self::with_site(DEFAULT_TITLE_SUFFIX, DEFAULT_CDN_MARKER)
    }

    /// Creates a parser with a custom `<title>` suffix and image CDN marker.
    pub fn with_site(title_suffix: impl Into<String>, cdn_marker: impl Into<String>) -> Self {
        Self { title_suffix: title_suffix.into(), cdn_marker: cdn_marker.into() }
    }

    /// Parses a provider response (raw HTML or an extraction-rules JSON object).
    ///
    /// Always returns a fully populated product.
    pub fn parse_product(&self, body: &str, source_url: &str, id: impl Into<String>) -> Product {
        if let Some(fields) = json_fields(body) {
            debug!("Provider returned structured JSON for {}", source_url);
            return self.parse_fields(&fields, source_url, id);
        }

        self.parse_html(body, source_url, id)
    }

    /// Runs the HTML cascade for every field.
    pub fn parse_html(&self, html: &str, source_url: &str, id: impl Into<String>) -> Product {
        if is_blocked_page(html) {
            warn!("Page for {} looks like an anti-bot challenge; fields will default", source_url);
        }

        let document = Html::parse_document(html);
        let mut product = Product::with_defaults(id, source_url);

        if let Some(title) = self.parse_title(&document) {
            product.title = title;
        }
        if let Some(price) = self.parse_price(html) {
            product.price = price;
        }
        if let Some(image_url) = self.parse_image(&document, html, source_url) {
            product.image_url = image_url;
        }
        if let Some(description) = self.parse_description(&document) {
            product.description = description;
        }
        if let Some(rating) = self.parse_rating(html) {
            product.rating = rating;
        }
        if let Some(reviews) = self.parse_reviews(html) {
            product.reviews = reviews;
        }

        debug!(
            "Extracted '{}' ({}, rating {}, {} reviews) from {}",
            product.title, product.price, product.rating, product.reviews, source_url
        );

        product
    }

    /// Maps an extraction-rules JSON response onto a product.
    fn parse_fields(
        &self,
        fields: &Map<String, Value>,
        source_url: &str,
        id: impl Into<String>,
    ) -> Product {
        let mut product = Product::with_defaults(id, source_url);

        if let Some(title) = string_field(fields, "title") {
            product.title = title;
        }
        if let Some(price) = string_field(fields, "price").and_then(|p| normalize_amount(&p)) {
            product.price = format!("${}", price);
        }
        product.original_price = string_field(fields, "originalPrice")
            .and_then(|p| normalize_amount(&p))
            .map(|p| format!("${}", p));
        if let Some(image_url) =
            string_field(fields, "imageUrl").and_then(|u| normalize_image_url(&u, source_url))
        {
            product.image_url = image_url;
        }
        if let Some(description) = string_field(fields, "description") {
            product.description = truncate_chars(&description, DESCRIPTION_MAX_CHARS);
        }
        if let Some(rating) = string_field(fields, "rating").and_then(|r| normalize_rating(&r)) {
            product.rating = rating;
        }
        if let Some(reviews) = string_field(fields, "reviews").and_then(|r| normalize_count(&r)) {
            product.reviews = reviews;
        }

        product
    }

    /// `og:title` wins over `<title>` (with the site suffix removed).
    fn parse_title(&self, document: &Html) -> Option<String> {
        let og_title = document
            .select(&meta::OG_TITLE)
            .filter_map(|e| e.value().attr("content"))
            .map(|c| c.trim().to_string())
            .find(|t| !t.is_empty());

        if og_title.is_some() {
            trace!("Title from og:title");
            return og_title;
        }

        document
            .select(&meta::TITLE)
            .next()
            .map(|e| {
                let text = e.text().collect::<String>();
                text.replacen(&self.title_suffix, "", 1).trim().to_string()
            })
            .filter(|t| !t.is_empty())
    }

    fn parse_price(&self, html: &str) -> Option<String> {
        text::PRICE.iter().enumerate().find_map(|(i, pattern)| {
            let raw = pattern.captures(html)?.get(1)?.as_str();
            let amount = normalize_amount(raw)?;
            trace!("Price pattern {} matched: {}", i, amount);
            Some(format!("${}", amount))
        })
    }

    fn parse_image(&self, document: &Html, html: &str, source_url: &str) -> Option<String> {
        let og_image = document
            .select(&meta::OG_IMAGE)
            .filter_map(|e| e.value().attr("content"))
            .find_map(|c| normalize_image_url(c, source_url));
        if og_image.is_some() {
            trace!("Image from og:image");
            return og_image;
        }

        let main_image = text::MAIN_IMAGE
            .captures(html)
            .and_then(|caps| caps.get(1))
            .and_then(|m| normalize_image_url(m.as_str(), source_url));
        if main_image.is_some() {
            trace!("Image from embedded mainImage");
            return main_image;
        }

        document
            .select(&meta::IMAGE)
            .filter_map(|e| e.value().attr("src"))
            .filter(|src| src.contains(self.cdn_marker.as_str()))
            .find_map(|src| normalize_image_url(src, source_url))
    }

    fn parse_description(&self, document: &Html) -> Option<String> {
        document
            .select(&meta::DESCRIPTION)
            .filter_map(|e| e.value().attr("content"))
            .map(str::trim)
            .find(|c| !c.is_empty())
            .map(|c| truncate_chars(c, DESCRIPTION_MAX_CHARS))
    }

    fn parse_rating(&self, html: &str) -> Option<String> {
        text::RATING.iter().find_map(|pattern| {
            let raw = pattern.captures(html)?.get(1)?.as_str();
            normalize_rating(raw)
        })
    }

    fn parse_reviews(&self, html: &str) -> Option<String> {
        text::REVIEWS.iter().find_map(|pattern| {
            let raw = pattern.captures(html)?.get(1)?.as_str();
            normalize_count(raw)
        })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true if the page is an anti-bot interstitial rather than a product.
pub fn is_blocked_page(html: &str) -> bool {
    blocked::MARKERS.iter().any(|marker| html.contains(marker))
}

/// Returns the object if `body` is a JSON object carrying any product field.
fn json_fields(body: &str) -> Option<Map<String, Value>> {
    if !body.trim_start().starts_with('{') {
        return None;
    }

    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return None;
    };

    const KEYS: [&str; 7] =
        ["title", "price", "originalPrice", "imageUrl", "description", "rating", "reviews"];
    KEYS.iter().any(|k| map.contains_key(*k)).then_some(map)
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    let value = match fields.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!value.is_empty()).then_some(value)
}

/// Strips currency markers and thousands separators: `US $1,299.00` -> `1299.00`.
fn normalize_amount(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("US").unwrap_or(trimmed).trim_start();
    let cleaned = trimmed.trim_start_matches('$').trim().replace(',', "");
    let cleaned = cleaned.trim_end_matches('.');

    let valid = cleaned.chars().any(|c| c.is_ascii_digit())
        && cleaned.chars().all(|c| c.is_ascii_digit() || c == '.')
        && cleaned.matches('.').count() <= 1;
    valid.then(|| cleaned.to_string())
}

/// Accepts ratings within 0.0..=5.0.
fn normalize_rating(raw: &str) -> Option<String> {
    let stars: f32 = raw.trim().parse().ok()?;
    (0.0..=5.0).contains(&stars).then(|| format!("{:.1}", stars))
}

/// Extracts a review count from text like `1,234`, `1,234 reviews` or `4.8 (1,234)`.
///
/// A number labelled as reviews wins; otherwise the first whole number is used,
/// skipping decimals such as a star rating.
fn normalize_count(raw: &str) -> Option<String> {
    let labelled = text::REVIEWS[0].captures(raw).and_then(|caps| caps.get(1));
    let token = match labelled {
        Some(m) => m.as_str(),
        None => text::NUMBER
            .find_iter(raw)
            .map(|m| m.as_str().trim_end_matches(['.', ',']))
            .find(|t| !t.contains('.'))?,
    };

    token.replace(',', "").parse::<u64>().ok().map(|n| n.to_string())
}

/// Makes an image reference an absolute https URL.
fn normalize_image_url(raw: &str, source_url: &str) -> Option<String> {
    let raw = raw.trim().replace("\\/", "/");
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }

    if let Some(rest) = raw.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    if let Some(rest) = raw.strip_prefix("http://") {
        return Some(format!("https://{}", rest));
    }
    if raw.starts_with("https://") {
        return Some(raw);
    }

    // Relative path: resolve against the page it came from
    let mut joined = Url::parse(source_url).ok()?.join(&raw).ok()?;
    match joined.scheme() {
        "https" => {}
        "http" => joined.set_scheme("https").ok()?,
        _ => return None,
    }
    Some(joined.to_string())
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
