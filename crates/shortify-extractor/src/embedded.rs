//! Embedded-JSON fallback sources: schema.org JSON-LD and framework
//! hydration state (`window.__PRELOADED_STATE__`, `initialData`).
//!
//! These are secondary data sources consulted when CSS selectors find
//! nothing. All access is best-effort: a missing key path yields `None`,
//! never an error.

use regex::Regex;
use serde_json::Value;

/// Parses the first usable `<script type="application/ld+json">` block
/// into a JSON object. A top-level array yields its first element.
pub(crate) fn jsonld_product(html: &str) -> Option<Value> {
    let script_re = Regex::new(
        r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#,
    )
    .expect("valid regex");

    for cap in script_re.captures_iter(html) {
        let Some(json_text) = cap.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(json_text) else {
            continue;
        };
        let item = match value {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        if item.is_object() {
            return Some(item);
        }
    }
    None
}

/// Product title from JSON-LD (`name` key path).
pub(crate) fn jsonld_title(html: &str) -> Option<String> {
    let product = jsonld_product(html)?;
    product.get("name")?.as_str().map(str::to_string)
}

/// Display price from JSON-LD (`offers.price`), dollar-prefixed.
/// The price may be a string or a number in the wild.
pub(crate) fn jsonld_price(html: &str) -> Option<String> {
    let product = jsonld_product(html)?;
    let price = product.get("offers")?.get("price")?;
    match price {
        Value::String(s) if !s.is_empty() => Some(format!("${s}")),
        Value::Number(n) => Some(format!("${n}")),
        _ => None,
    }
}

/// Extracts a global-state object literal assigned in inline script
/// content (`<marker> = {…};`) and parses it as JSON.
///
/// Markers are tried in order; for each, every occurrence is scanned
/// until one yields a balanced, parseable object.
pub(crate) fn preloaded_state(html: &str, markers: &[&str]) -> Option<Value> {
    for marker in markers {
        let assign_re = Regex::new(&format!(r"{}\s*=\s*", regex::escape(marker)))
            .expect("valid regex");
        for m in assign_re.find_iter(html) {
            let rest = &html[m.end()..];
            let Some(object_str) = extract_balanced_object(rest) else {
                continue;
            };
            if let Ok(value) = serde_json::from_str::<Value>(object_str) {
                return Some(value);
            }
        }
    }
    None
}

/// Try to extract a balanced JSON object from the start of `s`.
///
/// Scans character-by-character tracking brace depth, respecting string
/// literals and escape sequences. Returns the shortest prefix of `s`
/// that forms a complete `{…}` object, or `None` if unterminated.
/// Only `}` (not `]`) at depth 0 triggers a return.
fn extract_balanced_object(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            ']' => depth -= 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Walks a sequence of object keys, returning `None` at the first
/// missing step.
pub(crate) fn walk<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// Collects the `url` field of every object in a JSON array
/// (gallery/image-list shapes).
pub(crate) fn url_list(value: &Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.get("url"))
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn jsonld_title_and_price_from_product_block() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "Product",
                "name": "Ceramic Mug",
                "offers": {"@type": "Offer", "price": "12.50"}
            }
            </script>
            </head></html>
        "#;
        assert_eq!(jsonld_title(html).as_deref(), Some("Ceramic Mug"));
        assert_eq!(jsonld_price(html).as_deref(), Some("$12.50"));
    }

    #[test]
    fn jsonld_numeric_price_is_dollar_prefixed() {
        let html = r#"
            <script type="application/ld+json">
            {"@type": "Product", "name": "Mug", "offers": {"price": 9.99}}
            </script>
        "#;
        assert_eq!(jsonld_price(html).as_deref(), Some("$9.99"));
    }

    #[test]
    fn jsonld_array_uses_first_element() {
        let html = r#"
            <script type="application/ld+json">
            [{"@type": "Product", "name": "First"}, {"@type": "Product", "name": "Second"}]
            </script>
        "#;
        assert_eq!(jsonld_title(html).as_deref(), Some("First"));
    }

    #[test]
    fn jsonld_absent_or_malformed_yields_none() {
        assert_eq!(jsonld_title("<html><body>nothing</body></html>"), None);
        let html = r#"<script type="application/ld+json">not json</script>"#;
        assert_eq!(jsonld_title(html), None);
    }

    #[test]
    fn preloaded_state_captures_assigned_object() {
        let html = r#"
            <script>
            window.__PRELOADED_STATE__ = {"entities": {"goods": {"detail": {
                "images": [{"url": "https://img.example.com/1.jpg"}]
            }}}};
            other.code();
            </script>
        "#;
        let state = preloaded_state(html, &["__PRELOADED_STATE__"]).expect("state expected");
        let images = walk(&state, &["entities", "goods", "detail", "images"])
            .expect("image path expected");
        assert_eq!(url_list(images), vec!["https://img.example.com/1.jpg"]);
    }

    #[test]
    fn preloaded_state_tries_markers_in_order() {
        let html = r#"<script>initialData = {"data": {"ok": true}};</script>"#;
        let state =
            preloaded_state(html, &["initialData", "__PRELOADED_STATE__"]).expect("state");
        assert_eq!(walk(&state, &["data", "ok"]), Some(&json!(true)));
    }

    #[test]
    fn balanced_object_respects_strings_and_nesting() {
        assert_eq!(
            extract_balanced_object(r#"{"a": "brace } in string", "b": [1, {"c": 2}]} tail"#),
            Some(r#"{"a": "brace } in string", "b": [1, {"c": 2}]}"#)
        );
    }

    #[test]
    fn balanced_object_rejects_mismatched_closer() {
        // Depth hits 0 on `]`, which is not `}`; nothing is returned.
        assert_eq!(extract_balanced_object("{]"), None);
        assert_eq!(extract_balanced_object(r#"{"open": true"#), None);
    }

    #[test]
    fn walk_returns_none_for_missing_path() {
        let value = json!({"data": {"product": {"images": []}}});
        assert!(walk(&value, &["data", "product", "images"]).is_some());
        assert!(walk(&value, &["data", "missing", "images"]).is_none());
    }
}
