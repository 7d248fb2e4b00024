//! Integration tests for the field extractor using fixture files.

use ali_shopify::aliexpress::models::{DEFAULT_TITLE, PLACEHOLDER_IMAGE};
use ali_shopify::aliexpress::parser::{extract, is_blocked_page, Parser};
use ali_shopify::export::{self, SHOPIFY_HEADERS};

const PRODUCT_FIXTURE: &str = include_str!("fixtures/product_page.html");
const PRODUCT_URL: &str = "https://www.aliexpress.com/item/1005006172394821.html";

#[test]
fn test_extract_product_page() {
    let product = extract(PRODUCT_FIXTURE, PRODUCT_URL);

    // og:title beats <title>
    assert_eq!(product.title, "Wireless Bluetooth Earbuds TWS 5.3 Noise Cancelling Headphones");
    assert_eq!(product.price, "$24.99");
    assert!(product.original_price.is_none());

    // og:image beats mainImage and <img> tags
    assert_eq!(
        product.image_url,
        "https://ae01.alicdn.com/kf/S8f1c2d3e4b5a4c6d8e9f0a1b2c3d4e5fQ.jpg"
    );

    assert_eq!(
        product.description,
        "Smarter Shopping, Better Living! Enjoy Free Shipping Worldwide! Limited Time Sale. \
         Easy Return. Shop Quality & Best Earphones & Headphones Directly From China \
         Earphones & Headphones Suppliers."
    );
    assert_eq!(product.rating, "4.8");
    assert_eq!(product.reviews, "2317");
    assert_eq!(product.variants, vec!["Default"]);
    assert_eq!(product.url, PRODUCT_URL);
    assert!(!product.id.is_empty());
}

#[test]
fn test_extract_without_metadata_uses_embedded_image() {
    let stripped = PRODUCT_FIXTURE
        .lines()
        .filter(|line| !line.contains("og:"))
        .collect::<Vec<_>>()
        .join("\n");

    let product = extract(&stripped, PRODUCT_URL);
    assert_eq!(product.title, "Wireless Earbuds TWS 5.3 Headphones 44");
    assert_eq!(product.image_url, "https://ae01.alicdn.com/kf/Sffffffffffff.jpg");
}

#[test]
fn test_extract_ids_unique() {
    let a = extract(PRODUCT_FIXTURE, PRODUCT_URL);
    let b = extract(PRODUCT_FIXTURE, PRODUCT_URL);

    assert_ne!(a.id, b.id);
    assert_eq!(a.title, b.title);
    assert_eq!(a.price, b.price);
}

#[test]
fn test_extract_blocked_page() {
    let html = r#"
        <html>
        <head><title>Verification</title></head>
        <body>
            <div id="baxia-dialog-content">Please slide to verify</div>
            <script src="https://www.aliexpress.com/_____tmd_____/punish?x5secdata=abc"></script>
        </body>
        </html>
    "#;

    assert!(is_blocked_page(html));
    assert!(!is_blocked_page(PRODUCT_FIXTURE));

    let product = Parser::new().parse_product(html, PRODUCT_URL, "blocked-1");
    assert_eq!(product.title, "Verification");
    assert_eq!(product.price, "$0.00");
    assert_eq!(product.image_url, PLACEHOLDER_IMAGE);
}

#[test]
fn test_extract_empty_body() {
    let product = extract("", PRODUCT_URL);
    assert_eq!(product.title, DEFAULT_TITLE);
    assert_eq!(product.description, format!("Scraped from: {}", PRODUCT_URL));
}

#[test]
fn test_extract_then_export() {
    let product = extract(PRODUCT_FIXTURE, PRODUCT_URL);
    let bytes = export::to_csv(&[product]).unwrap();

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), SHOPIFY_HEADERS.len());

    let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), 1);

    let row = &records[0];
    assert_eq!(&row[0], "wireless-bluetooth-earbuds-tws-5-3-noise-cancelling-headphones");
    assert_eq!(&row[20], "24.99");
    assert_eq!(&row[21], "");
    assert_eq!(&row[25], "https://ae01.alicdn.com/kf/S8f1c2d3e4b5a4c6d8e9f0a1b2c3d4e5fQ.jpg");
}
