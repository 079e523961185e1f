//! JSON-LD structured data blocks.
//!
//! Blocks that fail to parse are retried once with the outermost `{...}`
//! span of their text (pages often wrap the object in comments or trailing
//! junk); anything still unparseable is skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

static LD_JSON_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid ld+json selector")
});

static OUTER_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\{.*\})").expect("valid outer object regex"));

/// Parse every JSON-LD block in document order.
pub(crate) fn blocks(document: &Html) -> Vec<Value> {
    document
        .select(&LD_JSON_SELECTOR)
        .filter_map(|script| parse_block(&script.text().collect::<String>()))
        .collect()
}

fn parse_block(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok().or_else(|| {
        let inner = OUTER_OBJECT.captures(raw)?.get(1)?.as_str();
        serde_json::from_str(inner).ok()
    })
}

/// The object nodes of a block: the block itself, the items of a top-level
/// array, and the members of any `@graph`.
pub(crate) fn nodes(value: &Value) -> Vec<&serde_json::Map<String, Value>> {
    let mut out = Vec::new();
    collect_nodes(value, &mut out);
    out
}

fn collect_nodes<'a>(value: &'a Value, out: &mut Vec<&'a serde_json::Map<String, Value>>) {
    match value {
        Value::Object(map) => {
            out.push(map);
            if let Some(graph) = map.get("@graph") {
                collect_nodes(graph, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_nodes(item, out);
            }
        }
        _ => {}
    }
}

/// `true` when a node's `@type` names an article-like schema type.
pub(crate) fn is_article_node(node: &serde_json::Map<String, Value>) -> bool {
    let article_token = |s: &str| {
        let lower = s.to_lowercase();
        lower.contains("article") || lower.contains("blogposting") || lower.contains("report")
    };
    match node.get("@type") {
        Some(Value::String(s)) => article_token(s),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(article_token),
        _ => false,
    }
}

/// Author names listed in a node's `author` field.
///
/// Accepts an object with `name`, a plain string, or an array of either.
pub(crate) fn author_names(node: &serde_json::Map<String, Value>) -> Vec<String> {
    fn push_name(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.push(s.trim().to_string()),
            Value::Object(map) => {
                if let Some(name) = map.get("name").and_then(Value::as_str) {
                    out.push(name.trim().to_string());
                }
            }
            Value::Array(items) => {
                for item in items {
                    if !item.is_array() {
                        push_name(item, out);
                    }
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    if let Some(author) = node.get("author") {
        push_name(author, &mut out);
    }
    out
}
