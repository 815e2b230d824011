//! Ordered-selector extraction engine shared by the platform scrapers.
//!
//! Each field is extracted by trying a per-platform list of CSS
//! selectors in priority order and keeping the first non-empty match.
//! The selector tables live in [`crate::platforms`]; this module only
//! knows how to evaluate them. Selector literals are static program
//! data, so an unparseable selector is a programmer error.

use std::collections::BTreeMap;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

fn compile(selector: &str) -> Selector {
    Selector::parse(selector).expect("valid selector")
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First non-empty trimmed text match over an ordered selector list.
pub(crate) fn first_selector_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    for selector in selectors {
        let sel = compile(selector);
        if let Some(text) = doc.select(&sel).map(element_text).find(|t| !t.is_empty()) {
            return Some(text);
        }
    }
    None
}

/// First non-empty attribute value over an ordered selector list.
pub(crate) fn first_selector_attr(doc: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    for selector in selectors {
        let sel = compile(selector);
        let found = doc
            .select(&sel)
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty());
        if let Some(value) = found {
            return Some(value.to_string());
        }
    }
    None
}

/// Collects image URLs from `src`/`data-src` attributes of elements
/// matched by `selectors`, in document order. URLs containing any of
/// the `exclude` substrings (`data:` URIs, icon sprites) are skipped.
/// No dedupe.
pub(crate) fn collect_images(doc: &Html, selectors: &[&str], exclude: &[&str]) -> Vec<String> {
    let mut images = Vec::new();
    for selector in selectors {
        let sel = compile(selector);
        for element in doc.select(&sel) {
            let src = element
                .value()
                .attr("src")
                .or_else(|| element.value().attr("data-src"));
            let Some(src) = src else { continue };
            if src.is_empty() || exclude.iter().any(|marker| src.contains(marker)) {
                continue;
            }
            images.push(src.to_string());
        }
    }
    images
}

/// Collects the non-empty text of every element matched by `selectors`,
/// in document order (feature bullets, highlight lists).
pub(crate) fn collect_list_items(doc: &Html, selectors: &[&str]) -> Vec<String> {
    let mut items = Vec::new();
    for selector in selectors {
        let sel = compile(selector);
        for element in doc.select(&sel) {
            let text = element_text(element);
            if !text.is_empty() {
                items.push(text);
            }
        }
    }
    items
}

/// One format of a specification/attribute table: a row selector plus
/// selectors for the key and (optionally) the value within each row.
/// When `value` is `None`, the value is the row text with the key and
/// the separating colon removed.
pub(crate) struct DetailTable {
    pub rows: &'static str,
    pub key: &'static str,
    pub value: Option<&'static str>,
}

/// Extracts key/value specification pairs, trying each table format in
/// order and stopping at the first format that yields any pairs.
pub(crate) fn collect_detail_pairs(
    doc: &Html,
    tables: &[DetailTable],
) -> BTreeMap<String, String> {
    for table in tables {
        let rows = compile(table.rows);
        let key_sel = compile(table.key);
        let value_sel = table.value.map(compile);

        let mut pairs = BTreeMap::new();
        for row in doc.select(&rows) {
            let Some(key_el) = row.select(&key_sel).next() else {
                continue;
            };
            let key = strip_once(&element_text(key_el), ":").trim().to_string();
            if key.is_empty() {
                continue;
            }

            let raw_value = match &value_sel {
                Some(sel) => row.select(sel).next().map(element_text).unwrap_or_default(),
                None => element_text(row),
            };
            let value = strip_once(&strip_once(&raw_value, &key), ":")
                .trim()
                .to_string();
            if !value.is_empty() {
                pairs.insert(key, value);
            }
        }

        if !pairs.is_empty() {
            return pairs;
        }
    }
    BTreeMap::new()
}

/// Extracts `"Key: Value"` pairs from list items (the Temu
/// specifications format).
pub(crate) fn collect_split_pairs(doc: &Html, selectors: &[&str]) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();
    for selector in selectors {
        let sel = compile(selector);
        for element in doc.select(&sel) {
            let text = element_text(element);
            let Some((key, value)) = text.split_once(':') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if !key.is_empty() && !value.is_empty() {
                pairs.insert(key.to_string(), value.to_string());
            }
        }
    }
    pairs
}

/// Removes the first occurrence of `pattern` from `text`.
fn strip_once(text: &str, pattern: &str) -> String {
    match text.find(pattern) {
        Some(pos) => {
            let mut out = String::with_capacity(text.len() - pattern.len());
            out.push_str(&text[..pos]);
            out.push_str(&text[pos + pattern.len()..]);
            out
        }
        None => text.to_string(),
    }
}

/// First embedded decimal token in a rating string
/// (`"4.5 out of 5 stars"` → `4.5`).
pub(crate) fn parse_rating(text: &str) -> Option<f64> {
    let re = Regex::new(r"(\d+\.?\d*)").expect("valid regex");
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// First embedded integer token in a review-count string, tolerating
/// thousands separators (`"1,208 ratings"` → `1208`).
pub(crate) fn parse_review_count(text: &str) -> Option<u64> {
    let re = Regex::new(r"(\d+[\d,]*)").expect("valid regex");
    let token = re.captures(text)?.get(1)?.as_str().replace(',', "");
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_selector_text_respects_priority_order() {
        let doc = Html::parse_document(
            r#"<div class="fallback">Second choice</div>
               <h1 id="main">  First choice  </h1>"#,
        );
        assert_eq!(
            first_selector_text(&doc, &["#main", ".fallback"]).as_deref(),
            Some("First choice")
        );
        assert_eq!(
            first_selector_text(&doc, &["#missing", ".fallback"]).as_deref(),
            Some("Second choice")
        );
        assert_eq!(first_selector_text(&doc, &["#missing"]), None);
    }

    #[test]
    fn first_selector_text_skips_empty_matches() {
        let doc = Html::parse_document(r#"<p class="a">   </p><p class="b">text</p>"#);
        assert_eq!(
            first_selector_text(&doc, &[".a", ".b"]).as_deref(),
            Some("text")
        );
    }

    #[test]
    fn collect_images_reads_src_and_data_src_and_skips_excluded() {
        let doc = Html::parse_document(
            r#"<img class="g" src="https://cdn.example.com/1.jpg">
               <img class="g" data-src="https://cdn.example.com/2.jpg">
               <img class="g" src="data:image/png;base64,xxxx">
               <img class="g" src="https://cdn.example.com/icon-cart.png">"#,
        );
        let images = collect_images(&doc, &["img.g"], &["data:image", "icon-"]);
        assert_eq!(
            images,
            vec![
                "https://cdn.example.com/1.jpg".to_string(),
                "https://cdn.example.com/2.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn detail_pairs_first_matching_format_wins() {
        let doc = Html::parse_document(
            r#"<table><tr><th>Brand</th><td>Acme</td></tr>
                      <tr><th>Color</th><td>Black</td></tr></table>
               <div class="spec-row">
                 <span class="spec-label">Weight</span>
                 <span class="spec-value">2.5 pounds</span>
               </div>"#,
        );
        let pairs = collect_detail_pairs(
            &doc,
            &[
                DetailTable {
                    rows: "table tr",
                    key: "th",
                    value: Some("td"),
                },
                DetailTable {
                    rows: ".spec-row",
                    key: ".spec-label",
                    value: Some(".spec-value"),
                },
            ],
        );
        assert_eq!(pairs.get("Brand").map(String::as_str), Some("Acme"));
        assert_eq!(pairs.get("Color").map(String::as_str), Some("Black"));
        assert!(
            !pairs.contains_key("Weight"),
            "second format must not be consulted when the first matched"
        );
    }

    #[test]
    fn detail_pairs_derive_value_from_row_when_no_value_selector() {
        let doc = Html::parse_document(
            r#"<ul class="detail-bullet-list">
                 <li><span class="a-text-bold">Brand:</span> Acme Corp</li>
               </ul>"#,
        );
        let pairs = collect_detail_pairs(
            &doc,
            &[DetailTable {
                rows: ".detail-bullet-list li",
                key: ".a-text-bold",
                value: None,
            }],
        );
        assert_eq!(pairs.get("Brand").map(String::as_str), Some("Acme Corp"));
    }

    #[test]
    fn split_pairs_parse_colon_separated_items() {
        let doc = Html::parse_document(
            r#"<ul class="specifications">
                 <li>Material: Cotton Blend</li>
                 <li>no separator here</li>
                 <li>Season: All Season</li>
               </ul>"#,
        );
        let pairs = collect_split_pairs(&doc, &[".specifications li"]);
        assert_eq!(pairs.len(), 2);
        assert_eq!(
            pairs.get("Material").map(String::as_str),
            Some("Cotton Blend")
        );
    }

    #[test]
    fn rating_takes_first_decimal_token() {
        assert_eq!(parse_rating("4.5 out of 5 stars"), Some(4.5));
        assert_eq!(parse_rating("Rated 4 stars"), Some(4.0));
        assert_eq!(parse_rating("no numbers"), None);
    }

    #[test]
    fn review_count_tolerates_thousands_separators() {
        assert_eq!(parse_review_count("1,208 ratings"), Some(1208));
        assert_eq!(parse_review_count("120"), Some(120));
        assert_eq!(parse_review_count("no reviews yet"), None);
    }
}
