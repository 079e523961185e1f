//! Headline cascade. Each strategy returns `Some` only for a usable
//! headline; the first one that does wins.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::{element_text, jsonld};
use crate::utils::{normalize_whitespace, truncate_chars, word_count};

/// Strategies 1–5 need more than three words.
const MIN_STRONG_WORDS: usize = 4;
/// Anything shorter than this is not a headline at all.
pub const MIN_HEADLINE_WORDS: usize = 3;
pub const MAX_HEADLINE_CHARS: usize = 300;
const MAX_BARE_H1_CHARS: usize = 200;
const TITLE_SEPARATORS: [&str; 4] = [" | ", " - ", " – ", " :: "];

static H1_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(headline|title|head|article[-_]title)").expect("valid h1 class regex"));
static H2_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(headline|article[-_]title)").expect("valid h2 class regex"));

macro_rules! selector {
    ($name:ident, $css:expr) => {
        static $name: Lazy<Selector> = Lazy::new(|| Selector::parse($css).expect("valid selector"));
    };
}

selector!(SOCIAL_TITLE, r#"meta[property="og:title"], meta[name="og:title"], meta[property="twitter:title"], meta[name="twitter:title"]"#);
selector!(ARTICLE, "article");
selector!(H1, "h1");
selector!(H2, "h2");
selector!(TITLE, "title");

fn strong(text: &str) -> Option<String> {
    let text = normalize_whitespace(text);
    (word_count(&text) >= MIN_STRONG_WORDS).then_some(text)
}

fn from_json_ld(blocks: &[Value]) -> Option<String> {
    blocks.iter().flat_map(jsonld::nodes).find_map(|node| {
        let headline = node.get("headline").and_then(Value::as_str);
        let name = jsonld::is_article_node(node)
            .then(|| node.get("name").and_then(Value::as_str))
            .flatten();
        headline.or(name).and_then(strong)
    })
}

fn from_social_meta(document: &Html) -> Option<String> {
    // og:title before twitter:title regardless of document order
    for prefix in ["og:", "twitter:"] {
        let found = document
            .select(&SOCIAL_TITLE)
            .filter(|meta| {
                let v = meta.value();
                v.attr("property").or_else(|| v.attr("name")).is_some_and(|p| p.starts_with(prefix))
            })
            .find_map(|meta| meta.value().attr("content").and_then(strong));
        if found.is_some() {
            return found;
        }
    }
    None
}

fn from_article_h1(document: &Html) -> Option<String> {
    let article = document.select(&ARTICLE).next()?;
    let h1 = article.select(&H1).next()?;
    strong(&element_text(&h1))
}

fn class_matches(el: &ElementRef<'_>, pattern: &Regex) -> bool {
    el.value().classes().any(|c| pattern.is_match(c))
}

fn from_headline_markup(document: &Html) -> Option<String> {
    let classed_h1 = document.select(&H1).find(|h| class_matches(h, &H1_CLASS));
    let itemprop_h1 = document
        .select(&H1)
        .find(|h| h.value().attr("itemprop") == Some("headline"));
    let classed_h2 = document.select(&H2).find(|h| class_matches(h, &H2_CLASS));

    [classed_h1, itemprop_h1, classed_h2]
        .into_iter()
        .flatten()
        .find_map(|el| strong(&element_text(&el)))
}

fn from_first_h1(document: &Html) -> Option<String> {
    let h1 = document.select(&H1).next()?;
    strong(&element_text(&h1)).filter(|text| text.chars().count() < MAX_BARE_H1_CHARS)
}

/// Longest segment around the first separator present, or the whole title.
pub fn title_segment(title: &str) -> String {
    let title = normalize_whitespace(title);
    let Some(sep) = TITLE_SEPARATORS.iter().copied().find(|sep| title.contains(sep)) else {
        return title;
    };
    let parts: Vec<&str> = title.split(sep).map(str::trim).collect();
    // first longest segment wins ties
    parts
        .iter()
        .rev()
        .max_by_key(|part| part.chars().count())
        .map_or(title.clone(), |part| (*part).to_string())
}

fn from_title(document: &Html) -> Option<String> {
    let title = document.select(&TITLE).next()?;
    let text = title_segment(&element_text(&title));
    (!text.is_empty()).then_some(text)
}

/// Run the cascade over a parsed page.
pub(crate) fn headline(document: &Html, blocks: &[Value]) -> Option<String> {
    let found = from_json_ld(blocks)
        .or_else(|| from_social_meta(document))
        .or_else(|| from_article_h1(document))
        .or_else(|| from_headline_markup(document))
        .or_else(|| from_first_h1(document))
        .or_else(|| from_title(document))?;

    let found = normalize_whitespace(&found);
    if word_count(&found) < MIN_HEADLINE_WORDS {
        return None;
    }
    Some(truncate_chars(&found, MAX_HEADLINE_CHARS))
}
