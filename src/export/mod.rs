//! Shopify bulk-import CSV export.
//!
//! One row per product, in input order, under a fixed 51-column header.
//! Every field is quoted and embedded quotes are doubled.

use crate::aliexpress::Product;
use crate::error::ScrapeError;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::path::Path;
use tracing::info;

/// File name used when no export path is given.
pub const DEFAULT_EXPORT_FILE: &str = "shopify-products-import.csv";

pub const VENDOR: &str = "AliExpress Import";
pub const TAGS: &str = "imported, aliexpress";

/// SEO descriptions are cut to this many characters.
pub const SEO_DESCRIPTION_MAX_CHARS: usize = 160;

/// Column header of the storefront product import template.
pub const SHOPIFY_HEADERS: [&str; 51] = [
    "Handle",
    "Title",
    "Body (HTML)",
    "Vendor",
    "Product Category",
    "Type",
    "Tags",
    "Published",
    "Option1 Name",
    "Option1 Value",
    "Option2 Name",
    "Option2 Value",
    "Option3 Name",
    "Option3 Value",
    "Variant SKU",
    "Variant Grams",
    "Variant Inventory Tracker",
    "Variant Inventory Qty",
    "Variant Inventory Policy",
    "Variant Fulfillment Service",
    "Variant Price",
    "Variant Compare At Price",
    "Variant Requires Shipping",
    "Variant Taxable",
    "Variant Barcode",
    "Image Src",
    "Image Position",
    "Image Alt Text",
    "Gift Card",
    "SEO Title",
    "SEO Description",
    "Google Shopping",
    "Google Shopping - Google Product Category",
    "Google Shopping - Gender",
    "Google Shopping - Age Group",
    "Google Shopping - MPN",
    "Google Shopping - AdWords Grouping",
    "Google Shopping - AdWords Labels",
    "Google Shopping - Condition",
    "Google Shopping - Custom Product",
    "Google Shopping - Custom Label 0",
    "Google Shopping - Custom Label 1",
    "Google Shopping - Custom Label 2",
    "Google Shopping - Custom Label 3",
    "Google Shopping - Custom Label 4",
    "Variant Image",
    "Variant Weight Unit",
    "Variant Tax Code",
    "Cost per item",
    "Price / International",
    "Status",
];

/// Builds a URL handle: lower-cased, every non-alphanumeric run collapsed to `-`.
pub fn handle(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_gap = false;

    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
            in_gap = false;
        } else if !in_gap {
            out.push('-');
            in_gap = true;
        }
    }

    out
}

fn strip_currency(price: &str) -> String {
    price.trim().replace('$', "")
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Maps one product onto the template columns.
pub fn row(product: &Product) -> [String; 51] {
    let s = |v: &str| v.to_string();
    let empty = String::new;
    let option_value = product.variants.first().map(String::as_str).unwrap_or("Default");

    [
        handle(&product.title),
        s(&product.title),
        s(&product.description),
        s(VENDOR),
        empty(),
        empty(),
        s(TAGS),
        s("TRUE"),
        s("Color"),
        s(option_value),
        empty(),
        empty(),
        empty(),
        empty(),
        s(&product.id),
        s("0"),
        empty(),
        s("100"),
        s("deny"),
        s("manual"),
        strip_currency(&product.price),
        product.original_price.as_deref().map(strip_currency).unwrap_or_default(),
        s("TRUE"),
        s("TRUE"),
        empty(),
        s(&product.image_url),
        s("1"),
        s(&product.title),
        s("FALSE"),
        s(&product.title),
        truncate_chars(&product.description, SEO_DESCRIPTION_MAX_CHARS),
        empty(),
        empty(),
        empty(),
        empty(),
        empty(),
        empty(),
        empty(),
        s("new"),
        empty(),
        empty(),
        empty(),
        empty(),
        empty(),
        empty(),
        empty(),
        s("lb"),
        empty(),
        empty(),
        empty(),
        s("active"),
    ]
}

/// Serializes products into a bulk-import CSV document.
pub fn to_csv(products: &[Product]) -> Result<Vec<u8>, ScrapeError> {
    if products.is_empty() {
        return Err(ScrapeError::NoProducts);
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(SHOPIFY_HEADERS)?;
    for product in products {
        writer.write_record(row(product))?;
    }

    writer.into_inner().map_err(|e| ScrapeError::Io(e.into_error()))
}

/// Writes the CSV to `path`. No file is created for an empty product list.
pub fn write_csv(path: impl AsRef<Path>, products: &[Product]) -> Result<(), ScrapeError> {
    let path = path.as_ref();
    let bytes = to_csv(products)?;
    std::fs::write(path, bytes)?;
    info!("Exported {} products to {}", products.len(), path.display());
    Ok(())
}
