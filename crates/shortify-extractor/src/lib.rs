//! Product-data extraction for e-commerce product pages.
//!
//! Given a product URL from a supported platform (Temu, Amazon, Walmart),
//! the [`Extractor`] routes to a platform scraper that fetches the page,
//! tries ordered CSS-selector strategies per field, falls back to embedded
//! JSON (JSON-LD, hydration state) when selectors miss, and returns a
//! normalized [`Product`].
//!
//! Scraping failures never surface as errors: a scraper that cannot
//! extract usable data returns a degraded `Product` populated with fixed
//! sample values and `metadata.extraction_error` set to the failure
//! reason. Only malformed input URLs and unsupported hostnames are
//! reported as [`ExtractError`]s.

pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod types;

mod embedded;
mod engine;
mod platforms;

pub use dispatch::Extractor;
pub use error::ExtractError;
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use types::{Extraction, Platform, Product, ProductMetadata};
