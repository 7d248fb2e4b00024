//! AliExpress-specific modules for fetching, parsing, and data models.

pub mod client;
pub mod models;
pub mod parser;
pub mod selectors;

pub use client::{ProductFetcher, ScrapingBeeClient};
pub use models::{IdGenerator, Product};
pub use parser::{extract, Parser};
