//! Temu product scraper.
//!
//! Unlike the other platforms, Temu gets a direct product-detail API
//! attempt before HTML scraping: when the URL carries a `goods_id`, the
//! detail endpoint sometimes answers even though the product page
//! itself is bot-gated. A failed or unrecognizable API response falls
//! through to the usual fetch-and-parse pipeline without raising.

use std::collections::BTreeMap;

use regex::Regex;
use scraper::Html;
use serde_json::Value;

use crate::embedded;
use crate::engine;
use crate::error::ExtractError;
use crate::fetch::Fetcher;
use crate::types::{Extraction, Platform, Product, ProductMetadata};

use super::{last_path_segment, require_domain};

const API_DETAIL_URL: &str = "https://www.temu.com/api/atlas/product/detail";

// Obfuscated class names (`_3-q1y` and friends) come from Temu's bundler
// and churn on redeploys; the generic names behind them are the stable
// half of each list.
const TITLE_SELECTORS: &[&str] = &[
    "h1.title",
    "._3-q1y",
    ".product-title",
    ".item-title",
    ".goods-name",
    ".product-name h1",
];
const DESCRIPTION_SELECTORS: &[&str] = &[
    "._3CRkq",
    ".product-detail-description",
    ".product-description",
    ".goods-description",
];
const PRICE_SELECTORS: &[&str] = &[
    "._2yjN1",
    ".price-current",
    "._25Uo9",
    ".price",
    ".product-price",
    ".goods-price",
];
const IMAGE_SELECTORS: &[&str] = &["._3Vf1T img", ".product-image img"];
const DETAIL_SELECTORS: &[&str] = &["._3tzGu li", ".specifications li"];
const FEATURE_SELECTORS: &[&str] = &["._3J0j5 li", ".features li"];
const RATING_SELECTORS: &[&str] = &["._2oUd9 .rating-average", ".rating"];
const REVIEW_COUNT_SELECTORS: &[&str] = &["._2oUd9 .rating-count", ".review-count"];

const STATE_IMAGE_PATH: &[&str] = &["entities", "goods", "detail", "images"];

pub(crate) async fn scrape(fetcher: &dyn Fetcher, url: &str) -> Result<Extraction, ExtractError> {
    require_domain(url, Platform::Temu)?;

    let goods_id = extract_goods_id(url);

    if let Some(id) = &goods_id {
        let api_url = format!("{API_DETAIL_URL}?goods_id={id}");
        match fetcher.fetch_json(&api_url, Platform::Temu.referer()).await {
            Ok(payload) => {
                if let Some(product) = product_from_api(&payload, id, url) {
                    tracing::debug!(
                        goods_id = %id,
                        "Temu detail API answered; skipping HTML scrape"
                    );
                    return Ok(Extraction::Complete(product));
                }
                tracing::debug!(
                    goods_id = %id,
                    "Temu detail API payload unrecognized; falling back to HTML"
                );
            }
            Err(err) => {
                tracing::debug!(
                    goods_id = %id,
                    error = %err,
                    "Temu detail API attempt failed; falling back to HTML"
                );
            }
        }
    }

    match fetcher.fetch_html(url, Platform::Temu.referer()).await {
        Ok(html) => Ok(extract_from_html(&html, goods_id.as_deref(), url)),
        Err(err) => {
            tracing::warn!(url, error = %err, "Temu page fetch failed; returning fallback product");
            Ok(degraded(goods_id.as_deref(), url, err.to_string()))
        }
    }
}

/// `goods_id` query parameter, or a purely numeric last path segment.
fn extract_goods_id(url: &str) -> Option<String> {
    let re = Regex::new(r"goods_id=([0-9]+)").expect("valid regex");
    if let Some(cap) = re.captures(url) {
        return Some(cap[1].to_string());
    }
    let segment = last_path_segment(url)?;
    segment.chars().all(|c| c.is_ascii_digit()).then_some(segment)
}

/// Maps a detail-API payload into a [`Product`], or `None` when the
/// payload does not carry the recognizable `data` object.
fn product_from_api(payload: &Value, goods_id: &str, url: &str) -> Option<Product> {
    let data = payload.get("data")?;
    if !data.is_object() {
        return None;
    }

    let title = data
        .get("goods_name")
        .and_then(Value::as_str)
        .unwrap_or("Temu Product");
    let description = data
        .get("goods_desc")
        .and_then(Value::as_str)
        .unwrap_or("No description available");
    let price = embedded::walk(data, &["price", "price_display"])
        .and_then(Value::as_str)
        .unwrap_or("$0.00");
    let images = data
        .get("gallery")
        .map(embedded::url_list)
        .unwrap_or_default();

    let rating = embedded::walk(data, &["review", "average"])
        .and_then(Value::as_f64)
        .unwrap_or(4.5);
    let review_count = embedded::walk(data, &["review", "count"])
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let product_details: BTreeMap<String, String> = data
        .get("specifications")
        .and_then(Value::as_array)
        .map(|specs| {
            specs
                .iter()
                .filter_map(|spec| {
                    let name = spec.get("name")?.as_str()?;
                    let value = spec.get("value")?.as_str()?;
                    Some((name.to_string(), value.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    let features: Vec<String> = data
        .get("selling_points")
        .and_then(Value::as_array)
        .map(|points| {
            points
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Product {
        title: title.to_string(),
        description: description.to_string(),
        price: price.to_string(),
        images,
        platform_id: goods_id.to_string(),
        platform_name: Platform::Temu,
        url: url.to_string(),
        metadata: ProductMetadata {
            rating: Some(rating),
            review_count: Some(review_count),
            product_details: (!product_details.is_empty()).then_some(product_details),
            features: (!features.is_empty()).then_some(features),
            extraction_error: None,
        },
    })
}

fn extract_from_html(html: &str, goods_id: Option<&str>, url: &str) -> Extraction {
    let doc = Html::parse_document(html);

    let title = engine::first_selector_text(&doc, TITLE_SELECTORS)
        .or_else(|| embedded::jsonld_title(html));
    let description = engine::first_selector_text(&doc, DESCRIPTION_SELECTORS);
    let price = engine::first_selector_text(&doc, PRICE_SELECTORS)
        .or_else(|| embedded::jsonld_price(html));

    let mut images = engine::collect_images(&doc, IMAGE_SELECTORS, &["data:image"]);
    if images.is_empty() {
        if let Some(state) = embedded::preloaded_state(html, &["__PRELOADED_STATE__"]) {
            if let Some(list) = embedded::walk(&state, STATE_IMAGE_PATH) {
                images = embedded::url_list(list);
            }
        }
    }

    // Neither a title nor a single image: nothing usable was extracted.
    if title.is_none() && images.is_empty() {
        return degraded(
            goods_id,
            url,
            "Failed to extract complete product data from Temu".to_string(),
        );
    }

    let product_details = engine::collect_split_pairs(&doc, DETAIL_SELECTORS);
    let features = engine::collect_list_items(&doc, FEATURE_SELECTORS);
    let rating = engine::first_selector_text(&doc, RATING_SELECTORS)
        .and_then(|text| engine::parse_rating(&text));
    let review_count = engine::first_selector_text(&doc, REVIEW_COUNT_SELECTORS)
        .and_then(|text| engine::parse_review_count(&text));

    let platform_id = goods_id
        .map(str::to_string)
        .or_else(|| last_path_segment(url))
        .unwrap_or_else(|| "unknown".to_string());

    Extraction::Complete(Product {
        title: title.unwrap_or_else(|| "Temu Product".to_string()),
        description: description.unwrap_or_else(|| "No description available".to_string()),
        price: price.unwrap_or_else(|| "Price not available".to_string()),
        images,
        platform_id,
        platform_name: Platform::Temu,
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

/// Fixed fallback payload. Uses the identifier parsed from the URL when
/// one was found, `"temu-sample"` otherwise.
fn degraded(goods_id: Option<&str>, url: &str, reason: String) -> Extraction {
    let platform_id = goods_id.map_or_else(|| "temu-sample".to_string(), str::to_string);
    let product = Product {
        title: "Sample Temu Product (Extraction Failed)".to_string(),
        description: "This is a sample product because we couldn't extract the real data \
                      from Temu. The extraction might be failing due to Temu's \
                      anti-scraping measures."
            .to_string(),
        price: "$23.99".to_string(),
        images: vec![
            "https://img.temu.com/o/upload_63b02439db5c414fa3ae18b1b4ad31ad.jpg".to_string(),
            "https://img.temu.com/o/upload_a4fb3bc70f9e41709aa5d22f2e87a2fc.jpg".to_string(),
            "https://img.temu.com/o/upload_2d1b0dcba6be41e6bc0c8d2b430b2ad4.jpg".to_string(),
        ],
        platform_id,
        platform_name: Platform::Temu,
        url: url.to_string(),
        metadata: ProductMetadata {
            rating: Some(4.5),
            review_count: Some(120),
            product_details: Some(BTreeMap::from([
                ("Material".to_string(), "Cotton Blend".to_string()),
                ("Style".to_string(), "Casual".to_string()),
                ("Color".to_string(), "Multiple Options".to_string()),
                ("Pattern".to_string(), "Solid".to_string()),
                ("Season".to_string(), "All Season".to_string()),
            ])),
            features: Some(vec![
                "High quality material".to_string(),
                "Comfortable fit".to_string(),
                "Stylish design".to_string(),
                "Suitable for daily wear".to_string(),
                "Easy to wash".to_string(),
            ]),
            extraction_error: Some(reason.clone()),
        },
    };
    Extraction::Degraded { product, reason }
}
