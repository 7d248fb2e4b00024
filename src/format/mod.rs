//! Output formatting for products (table, JSON, markdown, CSV).

use crate::aliexpress::Product;
use crate::config::OutputFormat;
use crate::export;

/// Formats products for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a single product.
    pub fn format_product(&self, product: &Product) -> String {
        match self.format {
            OutputFormat::Json => self.json_single(product),
            OutputFormat::Table => self.table_single(product),
            OutputFormat::Markdown => self.markdown_single(product),
            OutputFormat::Csv => self.csv_products(std::slice::from_ref(product)),
        }
    }

    /// Formats multiple products.
    pub fn format_products(&self, products: &[Product]) -> String {
        if products.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                _ => "No products found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_products(products),
            OutputFormat::Table => self.table_products(products),
            OutputFormat::Markdown => self.markdown_products(products),
            OutputFormat::Csv => self.csv_products(products),
        }
    }

    // JSON formatting

    fn json_single(&self, product: &Product) -> String {
        serde_json::to_string_pretty(product).unwrap_or_else(|_| "{}".to_string())
    }

    fn json_products(&self, products: &[Product]) -> String {
        serde_json::to_string_pretty(products).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_single(&self, product: &Product) -> String {
        let mut lines = Vec::new();

        lines.push(format!("ID:       {}", product.id));
        lines.push(format!("Title:    {}", product.title));
        lines.push(format!("URL:      {}", product.url));
        lines.push(format!("Price:    {}", price_text(product)));
        lines.push(format!("Rating:   {}/5 ({} reviews)", product.rating, product.reviews));
        lines.push(format!("Image:    {}", product.image_url));
        lines.push(format!("Variants: {}", product.variants.join(", ")));

        if !product.description.is_empty() {
            lines.push(format!("About:    {}", product.description));
        }

        lines.join("\n")
    }

    fn table_products(&self, products: &[Product]) -> String {
        let id_width = products.iter().map(|p| p.id.chars().count()).max().unwrap_or(2).max(2);
        let price_width = 12;
        let rating_width = 6;
        let reviews_width = 8;
        let title_width = 50;

        let mut lines = Vec::new();

        // Header
        lines.push(format!(
            "{:<id_width$}  {:<price_width$}  {:<rating_width$}  {:<reviews_width$}  {}",
            "ID", "Price", "Rating", "Reviews", "Title"
        ));
        lines.push(format!(
            "{:-<id_width$}  {:-<price_width$}  {:-<rating_width$}  {:-<reviews_width$}  {:-<title_width$}",
            "", "", "", "", ""
        ));

        // Rows
        for product in products {
            lines.push(format!(
                "{:<id_width$}  {:>price_width$}  {:>rating_width$}  {:>reviews_width$}  {}",
                product.id,
                product.price,
                product.rating,
                product.reviews,
                truncate(&product.title, title_width)
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} products", products.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_single(&self, product: &Product) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {}", product.title));
        lines.push(String::new());

        lines.push(format!("- **ID:** {}", product.id));
        lines.push(format!("- **URL:** [View on AliExpress]({})", product.url));

        match &product.original_price {
            Some(orig) => lines.push(format!("- **Price:** {} ~~{}~~", product.price, orig)),
            None => lines.push(format!("- **Price:** {}", product.price)),
        }

        lines.push(format!("- **Rating:** {}/5 ({} reviews)", product.rating, product.reviews));
        lines.push(format!("- **Variants:** {}", product.variants.join(", ")));
        lines.push(format!("- **Image:** ![{}]({})", product.title, product.image_url));

        if !product.description.is_empty() {
            lines.push(String::new());
            lines.push(product.description.clone());
        }

        lines.join("\n")
    }

    fn markdown_products(&self, products: &[Product]) -> String {
        let mut lines = Vec::new();

        lines.push("| ID | Price | Rating | Reviews | Title |".to_string());
        lines.push("|----|-------|--------|---------|-------|".to_string());

        for product in products {
            let title = truncate(&product.title, 40).replace('|', "\\|");
            lines.push(format!(
                "| {} | {} | {} | {} | [{}]({}) |",
                product.id, product.price, product.rating, product.reviews, title, product.url
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} products scraped*", products.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        export::SHOPIFY_HEADERS.iter().map(|h| format!("\"{}\"", h)).collect::<Vec<_>>().join(",")
    }

    fn csv_products(&self, products: &[Product]) -> String {
        match export::to_csv(products) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).trim_end().to_string(),
            Err(_) => self.csv_header(),
        }
    }
}

fn price_text(product: &Product) -> String {
    match (&product.original_price, product.discount_percent()) {
        (Some(orig), Some(off)) => format!("{} (was {}, -{}%)", product.price, orig, off),
        (Some(orig), None) => format!("{} (was {})", product.price, orig),
        (None, _) => product.price.clone(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
