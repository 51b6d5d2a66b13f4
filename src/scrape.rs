/*
 * The contents of this file are subject to the terms of the
 * Common Development and Distribution License, Version 1.0 only
 * (the "License").  You may not use this file except in compliance
 * with the License.
 *
 * See the file LICENSE in this distribution for details.
 * A copy of the CDDL is also available via the Internet at
 * http://www.opensource.org/licenses/cddl1.txt
 *
 * When distributing Covered Code, include this CDDL HEADER in each
 * file and include the contents of the LICENSE file from this
 * distribution.
 */

// Yet Another Suno Down Loader
// - scrape.rs file -

//! Helpers for digging values out of a fetched page.
//!
//! Every helper answers with `Option`: a page that lacks something is
//! normal, not an error.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::warn;
use url::Url;

/// A fetched page in the three shapes the extraction rules look at.
pub struct Page<'a> {
    pub text: &'a str,
    pub html: Html,
    // Every embedded JSON blob that parsed.
    pub blobs: Vec<Value>,
}

impl<'a> Page<'a> {
    pub fn parse(text: &'a str) -> Self {
        let html = Html::parse_document(text);
        let blobs = embedded_json(&html);

        Page { text, html, blobs }
    }
}

// Collects <script type="...json..."> bodies, JSON-LD and __NEXT_DATA__ included.
fn embedded_json(html: &Html) -> Vec<Value> {
    let script_selector = match Selector::parse("script") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut blobs = Vec::new();
    for script in html.select(&script_selector) {
        let is_json = script
            .value()
            .attr("type")
            .is_some_and(|t| t.to_ascii_lowercase().contains("json"))
            || script.value().attr("id") == Some("__NEXT_DATA__");
        if !is_json {
            continue;
        }

        let body = script.text().collect::<String>();
        let body = body.trim();
        if body.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(body) {
            Ok(value) => blobs.push(value),
            Err(e) => warn!(
                error = %e,
                "embedded JSON blob could not be parsed, falling back to the markup"
            ),
        }
    }

    blobs
}

// First non-empty capture in <text>; with alternations, whichever group took part.
pub fn search_regex(text: &str, re: &Regex) -> Option<String> {
    re.captures_iter(text).find_map(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .next()
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

// Text of the first element matching <css> that has any.
pub fn tag_text(page: &Page, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    page.html.select(&selector).find_map(|elem| {
        let text = elem.text().collect::<String>();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

// Attribute <attr> of the first element matching <css> that carries it.
pub fn tag_attr(page: &Page, css: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    page.html
        .select(&selector)
        .filter_map(|elem| elem.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Content of the first `<meta>` tag named like one of `names`, tried in order.
///
/// `property`, `name` and `itemprop` all count as the tag's name.
pub fn html_search_meta(page: &Page, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        let css = format!(
            r#"meta[property="{0}"], meta[name="{0}"], meta[itemprop="{0}"]"#,
            name
        );
        tag_attr(page, &css, "content")
    })
}

// Open Graph lookup, e.g. og_search(page, "title") for og:title.
pub fn og_search(page: &Page, prop: &str) -> Option<String> {
    let name = format!("og:{}", prop);
    html_search_meta(page, &[name.as_str()])
}

/// Looks up `keys` (in priority order) anywhere inside the JSON `blobs`.
///
/// The first value `coerce` accepts wins. Nested objects and arrays are
/// searched depth-first, so the caller doesn't need to know the layout.
pub fn try_get<T>(
    blobs: &[Value],
    keys: &[&str],
    coerce: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    keys.iter()
        .find_map(|key| blobs.iter().find_map(|blob| find_key(blob, key, &coerce)))
}

fn find_key<T>(value: &Value, key: &str, coerce: &impl Fn(&Value) -> Option<T>) -> Option<T> {
    match value {
        Value::Object(map) => map
            .get(key)
            .and_then(|v| coerce(v))
            .or_else(|| map.values().find_map(|v| find_key(v, key, coerce))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key, coerce)),
        _ => None,
    }
}

// Coerces a JSON string into a trimmed, non-empty String.
pub fn as_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Key names for [`json_field`], in priority order, with their raw-text
/// scanners compiled once.
pub struct JsonKeys {
    names: &'static [&'static str],
    raw: Vec<Regex>,
}

impl JsonKeys {
    pub fn new(names: &'static [&'static str]) -> Self {
        let raw = names.iter().filter_map(|key| key_value_regex(key)).collect();
        JsonKeys { names, raw }
    }
}

/// A JSON-ish `key: "value"` field, from the parsed blobs or from raw text.
///
/// The raw scan accepts plain (`"key":"value"`) as well as escaped
/// (`\"key\":\"value\"`) quoting, as pages like to embed JSON inside
/// string literals. A value runs up to the quote that opened it, so
/// `"Don't"` stays whole.
pub fn json_field(page: &Page, keys: &JsonKeys) -> Option<String> {
    try_get(&page.blobs, keys.names, as_text)
        .or_else(|| keys.raw.iter().find_map(|re| search_regex(page.text, re)))
}

fn key_value_regex(key: &str) -> Option<Regex> {
    // The key must not be the tail of a longer word ("name" vs. "display_name").
    // Values never cross a tag or a line.
    Regex::new(&format!(
        r#"(?:^|\W){}\\?["']\s*:\s*(?:\\?"((?:[^"\\<>\r\n]|\\[^"<>\r\n])*?)\\?"|\\?'((?:[^'\\<>\r\n]|\\[^'<>\r\n])*?)\\?')"#,
        regex::escape(key)
    ))
    .ok()
}

// Some(url) only for absolute http(s) URLs.
pub fn url_or_none(value: &str) -> Option<Url> {
    let url = Url::parse(value.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

// Finite, non-negative numbers only.
pub fn float_or_none(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && *f >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_lookup_accepts_property_and_name() {
        let page = Page::parse(
            r#"<html><head>
            <meta property="og:title" content="OG Title">
            <meta name="description" content=" Plain description ">
            </head></html>"#,
        );

        assert_eq!(og_search(&page, "title").as_deref(), Some("OG Title"));
        assert_eq!(
            html_search_meta(&page, &["og:description", "description"]).as_deref(),
            Some("Plain description")
        );
        assert_eq!(html_search_meta(&page, &["author"]), None);
    }

    #[test]
    fn try_get_respects_key_priority_and_nesting() {
        let blobs = vec![
            json!({"props": {"clip": {"src": "https://a/b.mp3"}}}),
            json!([{"audio_url": "https://c/d.mp3"}]),
        ];

        let found = try_get(&blobs, &["audio_url", "src"], as_text);
        assert_eq!(found.as_deref(), Some("https://c/d.mp3"));

        let found = try_get(&blobs, &["missing", "src"], as_text);
        assert_eq!(found.as_deref(), Some("https://a/b.mp3"));
    }

    #[test]
    fn try_get_skips_values_the_coercion_rejects() {
        let blobs = vec![json!({"duration": "soon", "clip": {"duration": 12.5}})];

        let found = try_get(&blobs, &["duration"], |v| v.as_f64());
        assert_eq!(found, Some(12.5));
    }

    #[test]
    fn json_field_reads_escaped_raw_text() {
        let page = Page::parse(r#"self.push("{\"display_name\":\"someone\"}")"#);
        assert_eq!(
            json_field(&page, &JsonKeys::new(&["display_name"])).as_deref(),
            Some("someone")
        );
    }

    #[test]
    fn json_field_keeps_apostrophes_inside_double_quotes() {
        let keys = JsonKeys::new(&["title"]);

        let page = Page::parse(r#"{"title":"Don't Stop Me Now"}"#);
        assert_eq!(json_field(&page, &keys).as_deref(), Some("Don't Stop Me Now"));

        let page = Page::parse(r#"push("{\"title\":\"It's Pronounced GIF!\"}")"#);
        assert_eq!(
            json_field(&page, &keys).as_deref(),
            Some("It's Pronounced GIF!")
        );
    }

    #[test]
    fn json_field_keeps_double_quotes_inside_single_quotes() {
        let page = Page::parse(r#"{'title': 'Say "hi"'}"#);
        assert_eq!(
            json_field(&page, &JsonKeys::new(&["title"])).as_deref(),
            Some(r#"Say "hi""#)
        );
    }

    #[test]
    fn json_field_tries_keys_in_order() {
        let page = Page::parse(r#"{"track_name":"Second","name":"First"}"#);
        let keys = JsonKeys::new(&["name", "track_name"]);
        assert_eq!(json_field(&page, &keys).as_deref(), Some("First"));
    }

    #[test]
    fn json_field_does_not_match_word_tails() {
        let page = Page::parse(r#"{"display_name":"someone"}"#);
        assert_eq!(json_field(&page, &JsonKeys::new(&["name"])), None);
    }

    #[test]
    fn malformed_blobs_are_skipped() {
        let page = Page::parse(
            r#"<script type="application/json">{"title": </script>
            <script type="application/ld+json">{"name": "ok"}</script>"#,
        );
        assert_eq!(page.blobs.len(), 1);
        assert_eq!(
            json_field(&page, &JsonKeys::new(&["name"])).as_deref(),
            Some("ok")
        );
    }

    #[test]
    fn url_and_float_coercions() {
        assert!(url_or_none("https://cdn.site/a.mp3").is_some());
        assert!(url_or_none("/relative/a.mp3").is_none());
        assert!(url_or_none("javascript:alert(1)").is_none());

        assert_eq!(float_or_none("152.64"), Some(152.64));
        assert_eq!(float_or_none("1.2.3"), None);
        assert_eq!(float_or_none("-3"), None);
        assert_eq!(float_or_none("inf"), None);
    }
}
