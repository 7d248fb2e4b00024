//! CSS selectors and text patterns for AliExpress product pages.
//!
//! Each field has an ordered list of patterns. Order encodes confidence:
//! structured metadata first, then embedded JSON, then rendered text.
//!
//! **Update process**: When a field stops resolving, capture an HTML sample,
//! add or reorder patterns here, and add a test fixture.

use regex_lite::Regex;
use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for structured page metadata.
pub mod meta {
    use super::*;

    /// Document title.
    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

    /// Open Graph title.
    pub static OG_TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("meta[property='og:title'][content]").unwrap());

    /// Open Graph image.
    pub static OG_IMAGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("meta[property='og:image'][content]").unwrap());

    /// Standard meta description.
    pub static DESCRIPTION: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("meta[name='description'][content]").unwrap());

    /// Any image with a source attribute.
    pub static IMAGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").unwrap());
}

/// Patterns matched against the raw document text.
pub mod text {
    use super::*;

    /// Price patterns, tried in order.
    pub static PRICE: LazyLock<[Regex; 4]> = LazyLock::new(|| {
        [
            // Localized "US $12.50"
            Regex::new(r"(?i)US \$([0-9,]+\.?[0-9]*)").unwrap(),
            // Bare "$12.50"
            Regex::new(r"\$([0-9,]+\.?[0-9]*)").unwrap(),
            // Embedded JSON "price":"12.50"
            Regex::new(r#"(?i)"price":"([^"]+)""#).unwrap(),
            // Rendered <span class="price">12.50</span>
            Regex::new(r"(?i)price[^>]*>\s*\$?([0-9,]+\.?[0-9]*)").unwrap(),
        ]
    });

    /// Embedded JSON "mainImage":"URL".
    pub static MAIN_IMAGE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"(?i)"mainImage":"([^"]+)""#).unwrap());

    /// Rating patterns, tried in order.
    pub static RATING: LazyLock<[Regex; 2]> = LazyLock::new(|| {
        [
            Regex::new(r"(?i)rating[^>]*>\s*([0-9]\.[0-9])").unwrap(),
            Regex::new(r#"(?i)"rating":([0-9]\.[0-9])"#).unwrap(),
        ]
    });

    /// Review count patterns, tried in order.
    pub static REVIEWS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
        [
            Regex::new(r"(?i)([0-9,]+)\s*reviews?").unwrap(),
            Regex::new(r#"(?i)"reviewCount":([0-9,]+)"#).unwrap(),
        ]
    });

    /// Numeric tokens in free text, decimals included so they can be skipped.
    pub static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9][0-9,.]*").unwrap());
}

/// Markers of anti-bot interstitials served instead of the product page.
pub mod blocked {
    pub static MARKERS: &[&str] = &["_____tmd_____/punish", "x5secdata", "baxia-dialog"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        let _ = &*meta::TITLE;
        let _ = &*meta::OG_TITLE;
        let _ = &*meta::OG_IMAGE;
        let _ = &*meta::DESCRIPTION;
        let _ = &*meta::IMAGE;
        assert_eq!(text::PRICE.len(), 4);
        let _ = &*text::MAIN_IMAGE;
        assert_eq!(text::RATING.len(), 2);
        assert_eq!(text::REVIEWS.len(), 2);
        let _ = &*text::NUMBER;
    }

    #[test]
    fn test_price_pattern_captures() {
        let caps = text::PRICE[0].captures("Now US $1,234.56 only").unwrap();
        assert_eq!(&caps[1], "1,234.56");

        let caps = text::PRICE[3].captures(r#"<span class="price-current"> 7.99</span>"#).unwrap();
        assert_eq!(&caps[1], "7.99");
    }

    #[test]
    fn test_review_pattern_case_insensitive() {
        let caps = text::REVIEWS[0].captures("2,481 Reviews").unwrap();
        assert_eq!(&caps[1], "2,481");
        let caps = text::REVIEWS[0].captures("1 review").unwrap();
        assert_eq!(&caps[1], "1");
    }
}
