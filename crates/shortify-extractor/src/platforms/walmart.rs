//! Walmart product scraper.
//!
//! Walmart renders most product data from hydration state, so images
//! are read from the embedded `initialData` / `__PRELOADED_STATE__`
//! JSON first and from hero-image DOM selectors only as a fallback.
//! Price selectors sometimes match a bare number, which gains a `$`
//! prefix here to keep the display-price contract.

use std::collections::BTreeMap;

use regex::Regex;
use scraper::Html;

use crate::embedded;
use crate::engine::{self, DetailTable};
use crate::error::ExtractError;
use crate::fetch::Fetcher;
use crate::types::{Extraction, Platform, Product, ProductMetadata};

use super::{last_path_segment, require_domain};

const TITLE_SELECTORS: &[&str] = &[
    r#"[data-testid="product-title"]"#,
    ".prod-ProductTitle",
    ".mb1.ph1.pa0-xl.bb.b--near-white.w-100 h1",
    "h1.f3.b.lh-copy.dark-gray.mt1.mb2",
];
const DESCRIPTION_SELECTORS: &[&str] = &[
    r#"[data-testid="product-description"]"#,
    ".about-product-description",
    "#product-about",
    ".product-description-content",
];
const PRICE_SELECTORS: &[&str] = &[
    r#"[data-testid="price-value"]"#,
    ".price-characteristic",
    ".b.f4.mt3.mb2",
    ".f1-l.f2-xl.mr1.lh-title.b",
    r#"span[itemprop="price"]"#,
];
const IMAGE_SELECTORS: &[&str] = &[
    "img.hover-zoom-hero-image",
    "img.prod-hero-image",
    "img.product-image",
];
const FEATURE_SELECTORS: &[&str] = &[
    ".product-highlights li",
    ".about-product-highlights li",
    r#"[data-testid="product-features"] li"#,
];
const RATING_SELECTORS: &[&str] = &[
    ".rating-number",
    ".average-rating",
    r#"[data-testid="product-rating"]"#,
];
const REVIEW_COUNT_SELECTORS: &[&str] = &[
    ".review-count",
    ".rating-count",
    r#"[data-testid="product-reviews-count"]"#,
];

const DETAIL_TABLES: &[DetailTable] = &[
    DetailTable {
        rows: ".product-specs-table tr, .specifications-table tr, \
               [data-testid=\"product-specs\"] tr",
        key: "th, td:first-child",
        value: Some("td:last-child"),
    },
    DetailTable {
        rows: ".spec-row, .product-specification-row",
        key: ".spec-label, .specification-label",
        value: Some(".spec-value, .specification-value"),
    },
];

const STATE_MARKERS: &[&str] = &["initialData", "__PRELOADED_STATE__"];
const STATE_IMAGE_PATHS: &[&[&str]] = &[
    &["data", "product", "images"],
    &["data", "product", "imageInfo", "allImages"],
];

pub(crate) async fn scrape(fetcher: &dyn Fetcher, url: &str) -> Result<Extraction, ExtractError> {
    require_domain(url, Platform::Walmart)?;

    let item_id = extract_item_id(url);

    match fetcher.fetch_html(url, Platform::Walmart.referer()).await {
        Ok(html) => Ok(extract_from_html(&html, item_id.as_deref(), url)),
        Err(err) => {
            tracing::warn!(url, error = %err, "Walmart page fetch failed; returning fallback product");
            Ok(degraded(item_id.as_deref(), url, err.to_string()))
        }
    }
}

/// Item id from `/ip/<slug>/<digits>` paths or the `itemId` query
/// parameter, or a purely numeric last path segment.
fn extract_item_id(url: &str) -> Option<String> {
    const PATTERNS: &[&str] = &[r"/ip/[^/]+/(\d+)", r"[?&]itemId=(\d+)"];
    for pattern in PATTERNS {
        let re = Regex::new(pattern).expect("valid regex");
        if let Some(cap) = re.captures(url) {
            return Some(cap[1].to_string());
        }
    }
    let segment = last_path_segment(url)?;
    segment.chars().all(|c| c.is_ascii_digit()).then_some(segment)
}

fn extract_from_html(html: &str, item_id: Option<&str>, url: &str) -> Extraction {
    let doc = Html::parse_document(html);

    let title = engine::first_selector_text(&doc, TITLE_SELECTORS)
        .or_else(|| embedded::jsonld_title(html));
    let description = engine::first_selector_text(&doc, DESCRIPTION_SELECTORS);
    let price = engine::first_selector_text(&doc, PRICE_SELECTORS)
        .map(|text| {
            if text.contains('$') {
                text
            } else {
                format!("${text}")
            }
        })
        .or_else(|| embedded::jsonld_price(html));

    let mut images = state_images(html);
    if images.is_empty() {
        images = engine::collect_images(&doc, IMAGE_SELECTORS, &["data:image", "icon-"]);
    }

    if title.is_none() && images.is_empty() {
        return degraded(
            item_id,
            url,
            "Failed to extract complete product data from Walmart".to_string(),
        );
    }

    let product_details = engine::collect_detail_pairs(&doc, DETAIL_TABLES);
    let features = engine::collect_list_items(&doc, FEATURE_SELECTORS);
    let rating = engine::first_selector_text(&doc, RATING_SELECTORS)
        .and_then(|text| engine::parse_rating(&text));
    let review_count = engine::first_selector_text(&doc, REVIEW_COUNT_SELECTORS)
        .and_then(|text| engine::parse_review_count(&text));

    Extraction::Complete(Product {
        title: title.unwrap_or_else(|| "Walmart Product".to_string()),
        description: description.unwrap_or_else(|| "No description available".to_string()),
        price: price.unwrap_or_else(|| "Price not available".to_string()),
        images,
        platform_id: item_id.map_or_else(|| "unknown".to_string(), str::to_string),
        platform_name: Platform::Walmart,
        url: url.to_string(),
        metadata: ProductMetadata {
            rating,
            review_count,
            product_details: (!product_details.is_empty()).then_some(product_details),
            features: (!features.is_empty()).then_some(features),
            extraction_error: None,
        },
    })
}

/// Image URLs from hydration-state JSON, trying each known key path.
fn state_images(html: &str) -> Vec<String> {
    let Some(state) = embedded::preloaded_state(html, STATE_MARKERS) else {
        return Vec::new();
    };
    for path in STATE_IMAGE_PATHS {
        if let Some(list) = embedded::walk(&state, path) {
            let images = embedded::url_list(list);
            if !images.is_empty() {
                return images;
            }
        }
    }
    Vec::new()
}

/// Fixed fallback payload. Uses the item id parsed from the URL when
/// one was found, `"walmart-sample"` otherwise.
fn degraded(item_id: Option<&str>, url: &str, reason: String) -> Extraction {
    let platform_id = item_id.map_or_else(|| "walmart-sample".to_string(), str::to_string);
    let product = Product {
        title: "Walmart Product (Extraction Failed)".to_string(),
        description: "This is a sample product because we couldn't extract the real data \
                      from Walmart. The extraction might be failing due to Walmart's \
                      anti-scraping measures."
            .to_string(),
        price: "$39.99".to_string(),
        images: vec![
            "https://i5.walmartimages.com/asr/2e7c1d30-8c7e-4eca-b068-5573386ac5d2.e144b6520f1e4fb88f957473b2bd9d64.jpeg"
                .to_string(),
        ],
        platform_id,
        platform_name: Platform::Walmart,
        url: url.to_string(),
        metadata: ProductMetadata {
            rating: Some(4.2),
            review_count: Some(158),
            product_details: Some(BTreeMap::from([
                ("Brand".to_string(), "Sample Brand".to_string()),
                ("Model".to_string(), "WM2023".to_string()),
                ("Color".to_string(), "Black".to_string()),
                ("Material".to_string(), "Mixed".to_string()),
                ("Weight".to_string(), "2.5 pounds".to_string()),
            ])),
            features: Some(vec![
                "High-quality materials for durability".to_string(),
                "Easy to use and maintain".to_string(),
                "Multipurpose design".to_string(),
                "Energy-efficient operation".to_string(),
                "Compact and lightweight".to_string(),
            ]),
            extraction_error: Some(reason.clone()),
        },
    };
    Extraction::Degraded { product, reason }
}
