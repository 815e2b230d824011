//! Amazon product scraper.
//!
//! The primary image source is the `data-a-dynamic-image` attribute on
//! the landing image: a JSON object whose keys are image URLs (values
//! are pixel dimensions). Plain `src` selectors are the fallback.

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
    "#productTitle",
    "#title",
    ".product-title",
    ".a-size-large.product-title-word-break",
];
const DESCRIPTION_SELECTORS: &[&str] = &[
    "#productDescription",
    "#feature-bullets",
    ".product-description",
];
const PRICE_SELECTORS: &[&str] = &[
    ".a-offscreen",
    "#priceblock_ourprice",
    "#priceblock_dealprice",
    ".a-price .a-offscreen",
];
const DYNAMIC_IMAGE_SELECTORS: &[&str] = &["#landingImage", "#imgBlkFront"];
const IMAGE_FALLBACK_SELECTORS: &[&str] =
    &["img.a-dynamic-image", "#landingImage", "#imgBlkFront"];
const FEATURE_SELECTORS: &[&str] = &["#feature-bullets ul li"];
const RATING_ATTR_SELECTORS: &[&str] = &["#acrPopover", ".a-star-medium-4"];
const REVIEW_COUNT_SELECTORS: &[&str] = &["#acrCustomerReviewText", "#ratings-count"];

const DETAIL_TABLES: &[DetailTable] = &[
    DetailTable {
        rows: ".detail-bullet-list li",
        key: ".a-text-bold",
        value: None,
    },
    DetailTable {
        rows: "#productDetails_detailBullets_sections1 tr, #productDetails tr, \
               #detailBulletsWrapper_feature_div li",
        key: "th, .a-text-bold",
        value: Some("td, span:not(.a-text-bold)"),
    },
];

pub(crate) async fn scrape(fetcher: &dyn Fetcher, url: &str) -> Result<Extraction, ExtractError> {
    require_domain(url, Platform::Amazon)?;

    let asin = extract_asin(url);

    match fetcher.fetch_html(url, Platform::Amazon.referer()).await {
        Ok(html) => Ok(extract_from_html(&html, asin.as_deref(), url)),
        Err(err) => {
            tracing::warn!(url, error = %err, "Amazon page fetch failed; returning fallback product");
            Ok(degraded(asin.as_deref(), url, err.to_string()))
        }
    }
}

/// ASIN from the common URL patterns (`/dp/`, `/product/`,
/// `/gp/product/`), or a 10-character alphanumeric last path segment.
fn extract_asin(url: &str) -> Option<String> {
    const PATTERNS: &[&str] = &[
        r"/dp/([A-Z0-9]{10})",
        r"/product/([A-Z0-9]{10})",
        r"/gp/product/([A-Z0-9]{10})",
    ];
    for pattern in PATTERNS {
        let re = Regex::new(pattern).expect("valid regex");
        if let Some(cap) = re.captures(url) {
            return Some(cap[1].to_string());
        }
    }

    let segment = last_path_segment(url)?;
    let shape = Regex::new(r"^[A-Z0-9]{10}$").expect("valid regex");
    shape.is_match(&segment).then_some(segment)
}

fn extract_from_html(html: &str, asin: Option<&str>, url: &str) -> Extraction {
    let doc = Html::parse_document(html);

    let title = engine::first_selector_text(&doc, TITLE_SELECTORS)
        .or_else(|| embedded::jsonld_title(html));
    let description = engine::first_selector_text(&doc, DESCRIPTION_SELECTORS);
    let price = engine::first_selector_text(&doc, PRICE_SELECTORS)
        .or_else(|| embedded::jsonld_price(html));

    let mut images = dynamic_images(&doc);
    if images.is_empty() {
        images = engine::collect_images(&doc, IMAGE_FALLBACK_SELECTORS, &["data:image"]);
    }

    if title.is_none() && images.is_empty() {
        return degraded(
            asin,
            url,
            "Failed to extract complete product data from Amazon".to_string(),
        );
    }

    let features = engine::collect_list_items(&doc, FEATURE_SELECTORS);
    let product_details = engine::collect_detail_pairs(&doc, DETAIL_TABLES);
    let rating = engine::first_selector_attr(&doc, RATING_ATTR_SELECTORS, "title")
        .and_then(|text| engine::parse_rating(&text));
    let review_count = engine::first_selector_text(&doc, REVIEW_COUNT_SELECTORS)
        .and_then(|text| engine::parse_review_count(&text));

    Extraction::Complete(Product {
        title: title.unwrap_or_else(|| "Amazon Product".to_string()),
        description: description.unwrap_or_else(|| "No description available".to_string()),
        price: price.unwrap_or_else(|| "Price not available".to_string()),
        images,
        platform_id: asin.map_or_else(|| "unknown".to_string(), str::to_string),
        platform_name: Platform::Amazon,
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

/// Image URLs from the `data-a-dynamic-image` JSON attribute, whose
/// keys are the URLs themselves. Attribute order is kept (the page
/// lists the primary image first), which relies on `serde_json`'s
/// `preserve_order` feature.
fn dynamic_images(doc: &Html) -> Vec<String> {
    let Some(raw) = engine::first_selector_attr(doc, DYNAMIC_IMAGE_SELECTORS, "data-a-dynamic-image")
    else {
        return Vec::new();
    };
    match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&raw) {
        Ok(map) => map.keys().cloned().collect(),
        Err(err) => {
            tracing::debug!(error = %err, "unparseable data-a-dynamic-image attribute");
            Vec::new()
        }
    }
}

/// Fixed fallback payload. Uses the ASIN parsed from the URL when one
/// was found, `"amazon-sample"` otherwise.
fn degraded(asin: Option<&str>, url: &str, reason: String) -> Extraction {
    let platform_id = asin.map_or_else(|| "amazon-sample".to_string(), str::to_string);
    let product = Product {
        title: "Amazon Product (Extraction Failed)".to_string(),
        description: "This is a sample product because we couldn't extract the real data \
                      from Amazon. The extraction might be failing due to Amazon's \
                      anti-scraping measures."
            .to_string(),
        price: "$29.99".to_string(),
        images: vec![
            "https://m.media-amazon.com/images/I/71jG+e7roXL._AC_SL1500_.jpg".to_string(),
        ],
        platform_id,
        platform_name: Platform::Amazon,
        url: url.to_string(),
        metadata: ProductMetadata {
            rating: Some(4.5),
            review_count: Some(120),
            product_details: Some(BTreeMap::from([
                ("Brand".to_string(), "Sample Brand".to_string()),
                ("Color".to_string(), "Black".to_string()),
                ("Material".to_string(), "Plastic".to_string()),
                ("Weight".to_string(), "1.5 pounds".to_string()),
            ])),
            features: Some(vec![
                "Premium quality design".to_string(),
                "Durable construction".to_string(),
                "Easy to assemble".to_string(),
                "Lightweight and portable".to_string(),
                "Excellent customer service".to_string(),
            ]),
            extraction_error: Some(reason.clone()),
        },
    };
    Extraction::Degraded { product, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asin_from_dp_product_and_gp_paths() {
        assert_eq!(
            extract_asin("https://www.amazon.com/dp/B08N5WRWNW").as_deref(),
            Some("B08N5WRWNW")
        );
        assert_eq!(
            extract_asin("https://www.amazon.com/Some-Name/product/B000123456?th=1").as_deref(),
            Some("B000123456")
        );
        assert_eq!(
            extract_asin("https://www.amazon.com/gp/product/B0C1234567").as_deref(),
            Some("B0C1234567")
        );
    }

    #[test]
    fn asin_from_shaped_last_segment() {
        assert_eq!(
            extract_asin("https://www.amazon.com/item/B09ABCDE12").as_deref(),
            Some("B09ABCDE12")
        );
        assert_eq!(
            extract_asin("https://www.amazon.com/item/not-an-asin"),
            None
        );
    }

    #[test]
    fn dynamic_image_attribute_is_primary_image_source() {
        let html = r#"
            <img id="landingImage"
                 src="https://m.media-amazon.com/images/I/small.jpg"
                 data-a-dynamic-image='{"https://m.media-amazon.com/images/I/zoom.jpg":[1000,1000],"https://m.media-amazon.com/images/I/alt.jpg":[500,500]}'>
        "#;
        let doc = Html::parse_document(html);
        assert_eq!(
            dynamic_images(&doc),
            vec![
                "https://m.media-amazon.com/images/I/zoom.jpg".to_string(),
                "https://m.media-amazon.com/images/I/alt.jpg".to_string(),
            ],
            "URLs must come out in attribute order, not key-sorted"
        );
    }

    #[test]
    fn unparseable_dynamic_image_attribute_yields_no_images() {
        let doc = Html::parse_document(r#"<img id="landingImage" data-a-dynamic-image="not json">"#);
        assert!(dynamic_images(&doc).is_empty());
    }

    #[test]
    fn full_fixture_extracts_all_fields() {
        let html = r#"
            <html><body>
            <span id="productTitle">  Wireless Mouse  </span>
            <div id="productDescription">A reliable wireless mouse.</div>
            <span class="a-price"><span class="a-offscreen">$19.99</span></span>
            <img id="landingImage"
                 data-a-dynamic-image='{"https://m.media-amazon.com/images/I/a.jpg":[500,500]}'>
            <div id="feature-bullets"><ul>
              <li>2.4 GHz connection</li>
              <li>18-month battery life</li>
            </ul></div>
            <ul class="detail-bullet-list">
              <li><span class="a-text-bold">Brand:</span> Logi</li>
            </ul>
            <span id="acrPopover" title="4.5 out of 5 stars"></span>
            <span id="acrCustomerReviewText">1,208 ratings</span>
            </body></html>
        "#;
        let Extraction::Complete(product) = extract_from_html(
            html,
            Some("B08N5WRWNW"),
            "https://www.amazon.com/dp/B08N5WRWNW",
        ) else {
            panic!("expected complete extraction");
        };

        assert_eq!(product.title, "Wireless Mouse");
        assert_eq!(product.price, "$19.99");
        assert_eq!(product.images, vec!["https://m.media-amazon.com/images/I/a.jpg"]);
        assert_eq!(product.platform_id, "B08N5WRWNW");
        assert_eq!(product.metadata.rating, Some(4.5));
        assert_eq!(product.metadata.review_count, Some(1208));
        assert_eq!(
            product.metadata.features.as_deref(),
            Some(
                &[
                    "2.4 GHz connection".to_string(),
                    "18-month battery life".to_string()
                ][..]
            )
        );
        let details = product.metadata.product_details.expect("details");
        assert_eq!(details.get("Brand").map(String::as_str), Some("Logi"));
    }

    #[test]
    fn title_without_images_is_partial_success_not_fallback() {
        let html = r#"<span id="productTitle">Standing Desk</span>"#;
        let Extraction::Complete(product) =
            extract_from_html(html, None, "https://www.amazon.com/item/standing-desk")
        else {
            panic!("partial data must not force fallback");
        };
        assert_eq!(product.title, "Standing Desk");
        assert!(product.images.is_empty());
        assert_eq!(product.price, "Price not available");
        assert_eq!(product.description, "No description available");
        assert_eq!(product.platform_id, "unknown");
        assert_eq!(product.metadata.extraction_error, None);
    }

    #[test]
    fn empty_page_degrades_to_fixed_fallback() {
        let extraction =
            extract_from_html("<html></html>", None, "https://www.amazon.com/gp/cart");
        let Extraction::Degraded { product, .. } = extraction else {
            panic!("expected degraded extraction");
        };
        assert_eq!(product.title, "Amazon Product (Extraction Failed)");
        assert_eq!(product.platform_id, "amazon-sample");
        assert_eq!(product.price, "$29.99");
        assert!(product.metadata.extraction_error.is_some());
    }
}
