//! Normalized product data model.
//!
//! The serialized JSON shape of [`Product`] (camelCase keys) is the
//! contract with downstream consumers; field renames here are breaking
//! changes for them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A supported e-commerce platform.
///
/// Fixed per scraper by the dispatcher's routing decision, never inferred
/// from page content. Serializes to the lowercase platform literal
/// (`"temu"`, `"amazon"`, `"walmart"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Temu,
    Amazon,
    Walmart,
}

impl Platform {
    /// The lowercase platform literal used in serialized output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Temu => "temu",
            Platform::Amazon => "amazon",
            Platform::Walmart => "walmart",
        }
    }

    /// Hostname substring that identifies a URL as belonging to this
    /// platform.
    #[must_use]
    pub(crate) fn domain_marker(self) -> &'static str {
        match self {
            Platform::Temu => "temu.com",
            Platform::Amazon => "amazon.com",
            Platform::Walmart => "walmart.com",
        }
    }

    /// Referer header sent with page fetches. Product pages respond to
    /// bot-like requests more readily when the referer is the platform's
    /// own storefront.
    #[must_use]
    pub(crate) fn referer(self) -> &'static str {
        match self {
            Platform::Temu => "https://www.temu.com/",
            Platform::Amazon => "https://www.amazon.com/",
            Platform::Walmart => "https://www.walmart.com/",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized product extracted from a platform product page.
///
/// Always complete: fields that could not be extracted carry documented
/// placeholder values (`"Price not available"` and the like) rather than
/// being absent. A degraded result is distinguishable only via
/// [`ProductMetadata::extraction_error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub title: String,
    pub description: String,
    /// Display-formatted price string (e.g. `"$23.99"`), not a decimal.
    pub price: String,
    /// Absolute image URLs in scraping order. May be empty; no dedupe.
    pub images: Vec<String>,
    /// Platform-native product key (ASIN, `goods_id`, item id);
    /// `"unknown"` when unextractable.
    pub platform_id: String,
    pub platform_name: Platform,
    /// The input URL, normalized to include a scheme.
    pub url: String,
    pub metadata: ProductMetadata,
}

impl Product {
    /// Warning sentence surfaced to end users alongside a degraded
    /// result. `None` when extraction completed without error.
    #[must_use]
    pub fn extraction_warning(&self) -> Option<String> {
        self.metadata.extraction_error.as_ref().map(|_| {
            format!(
                "Some product data could not be extracted directly from {}. \
                 The data shown may be incomplete.",
                self.platform_name
            )
        })
    }
}

/// Open-ended metadata bag on a [`Product`]. Absent fields are omitted
/// from serialized output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u64>,
    /// Specification/attribute table scraped from the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_details: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    /// Set only on degraded results: the message of the failure that
    /// forced fallback output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
}

/// Outcome of one scraper invocation.
///
/// Scrapers never raise for ordinary scraping failure; instead they
/// report it here. `Degraded` carries a complete fallback [`Product`]
/// (with `metadata.extraction_error` already set) plus the reason,
/// so callers can log or surface it without re-deriving.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Extraction produced a usable result (possibly with individual
    /// fields at their placeholder defaults).
    Complete(Product),
    /// Extraction failed hard; `product` is the platform's fixed
    /// fallback payload.
    Degraded { product: Product, reason: String },
}

impl Extraction {
    /// The extracted product, complete or degraded.
    #[must_use]
    pub fn product(&self) -> &Product {
        match self {
            Extraction::Complete(product) | Extraction::Degraded { product, .. } => product,
        }
    }

    /// Consumes the outcome, returning the product.
    #[must_use]
    pub fn into_product(self) -> Product {
        match self {
            Extraction::Complete(product) | Extraction::Degraded { product, .. } => product,
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Extraction::Degraded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_serializes_with_camel_case_contract_keys() {
        let product = Product {
            title: "Wireless Mouse".to_string(),
            description: "No description available".to_string(),
            price: "$19.99".to_string(),
            images: vec!["https://example.com/a.jpg".to_string()],
            platform_id: "B08N5WRWNW".to_string(),
            platform_name: Platform::Amazon,
            url: "https://www.amazon.com/dp/B08N5WRWNW".to_string(),
            metadata: ProductMetadata {
                rating: Some(4.5),
                review_count: Some(120),
                ..ProductMetadata::default()
            },
        };

        let json = serde_json::to_value(&product).expect("serialize product");
        assert_eq!(json["platformId"], "B08N5WRWNW");
        assert_eq!(json["platformName"], "amazon");
        assert_eq!(json["metadata"]["reviewCount"], 120);
        assert!(
            json["metadata"].get("extractionError").is_none(),
            "absent metadata fields must be omitted"
        );
    }

    #[test]
    fn extraction_warning_names_the_platform() {
        let product = Product {
            title: "Walmart Product (Extraction Failed)".to_string(),
            description: String::new(),
            price: "$39.99".to_string(),
            images: vec![],
            platform_id: "walmart-sample".to_string(),
            platform_name: Platform::Walmart,
            url: "https://www.walmart.com/ip/x/1".to_string(),
            metadata: ProductMetadata {
                extraction_error: Some("HTTP error".to_string()),
                ..ProductMetadata::default()
            },
        };

        let warning = product.extraction_warning().expect("warning expected");
        assert!(warning.contains("walmart"), "warning should name platform");
    }

    #[test]
    fn extraction_warning_absent_for_clean_results() {
        let product = Product {
            title: "Anything".to_string(),
            description: String::new(),
            price: "$1.00".to_string(),
            images: vec![],
            platform_id: "unknown".to_string(),
            platform_name: Platform::Temu,
            url: "https://www.temu.com/g".to_string(),
            metadata: ProductMetadata::default(),
        };
        assert_eq!(product.extraction_warning(), None);
    }
}
