//! Byline candidates. Unlike the headline cascade every strategy
//! contributes; the validator decides later which candidates are people.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::{element_text, jsonld};
use crate::utils::{normalize_whitespace, word_count};

pub const MIN_CANDIDATE_WORDS: usize = 2;
pub const MAX_CANDIDATE_WORDS: usize = 6;

const AUTHOR_HREF_SEGMENTS: [&str; 5] = ["/author", "/writer", "/journalist", "/profile", "/by/"];

static AUTHOR_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(author|byline|writer|contributor|person[-_]name|posted[-_]by)")
        .expect("valid author class regex")
});
static ARTICLE_AUTHOR_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)author").expect("valid article author class regex"));
static BYLINE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(written\s+by|posted\s+by|by|author|reporter)\b\s*:?\s*")
        .expect("valid byline prefix regex")
});

macro_rules! selector {
    ($name:ident, $css:expr) => {
        static $name: Lazy<Selector> = Lazy::new(|| Selector::parse($css).expect("valid selector"));
    };
}

selector!(REL_AUTHOR, r#"a[rel~="author"]"#);
selector!(ITEMPROP_AUTHOR, r#"[itemprop~="author"]"#);
selector!(ITEMPROP_NAME, r#"[itemprop~="name"]"#);
selector!(META_AUTHOR, r#"meta[name="author"], meta[property="author"]"#);
selector!(BYLINE_TAGS, "a, span, div, p");
selector!(LINKS, "a[href]");
selector!(DATA_AUTHOR, "[data-author]");
selector!(KNOWN_AUTHOR_CLASSES, ".author-name, .byline-name, .contributor-name, .writer-name");
selector!(ARTICLE, "article");
selector!(ARTICLE_BYLINE_TAGS, "span, div, p");

/// Remove a leading "By", "Written by", "Author:" style prefix.
pub fn strip_byline_prefix(text: &str) -> String {
    BYLINE_PREFIX.replace(text.trim(), "").trim().to_string()
}

fn has_class(el: &ElementRef<'_>, pattern: &Regex) -> bool {
    el.value().classes().any(|c| pattern.is_match(c))
}

#[derive(Default)]
struct Candidates(BTreeSet<String>);

impl Candidates {
    fn offer(&mut self, raw: &str) {
        let name = normalize_whitespace(raw);
        if (MIN_CANDIDATE_WORDS..=MAX_CANDIDATE_WORDS).contains(&word_count(&name)) {
            self.0.insert(name);
        }
    }
}

/// Gather every byline candidate of 2–6 words on the page.
pub(crate) fn candidates(document: &Html, blocks: &[Value]) -> BTreeSet<String> {
    let mut found = Candidates::default();

    for node in blocks.iter().flat_map(jsonld::nodes) {
        for name in jsonld::author_names(node) {
            found.offer(&name);
        }
    }

    for tag in document.select(&REL_AUTHOR) {
        found.offer(&element_text(&tag));
    }

    for tag in document.select(&ITEMPROP_AUTHOR) {
        match tag.select(&ITEMPROP_NAME).next() {
            Some(name) => found.offer(&element_text(&name)),
            None => found.offer(&element_text(&tag)),
        }
    }

    if let Some(content) = document
        .select(&META_AUTHOR)
        .find_map(|meta| meta.value().attr("content"))
    {
        found.offer(content);
    }

    for tag in document.select(&BYLINE_TAGS).filter(|t| has_class(t, &AUTHOR_CLASS)) {
        found.offer(&strip_byline_prefix(&element_text(&tag)));
    }

    for tag in document.select(&LINKS) {
        let href = tag.value().attr("href").unwrap_or_default().to_lowercase();
        if AUTHOR_HREF_SEGMENTS.iter().any(|seg| href.contains(seg)) {
            found.offer(&element_text(&tag));
        }
    }

    for tag in document.select(&DATA_AUTHOR) {
        if let Some(name) = tag.value().attr("data-author") {
            found.offer(name);
        }
    }

    for tag in document.select(&KNOWN_AUTHOR_CLASSES) {
        found.offer(&element_text(&tag));
    }

    if let Some(article) = document.select(&ARTICLE).next() {
        for tag in article
            .select(&ARTICLE_BYLINE_TAGS)
            .filter(|t| has_class(t, &ARTICLE_AUTHOR_CLASS))
        {
            found.offer(&strip_byline_prefix(&element_text(&tag)));
        }
    }

    found.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let blocks = jsonld::blocks(&document);
        candidates(&document, &blocks).into_iter().collect()
    }

    #[test]
    fn test_strip_byline_prefix() {
        assert_eq!(strip_byline_prefix("By: Rahul Sharma"), "Rahul Sharma");
        assert_eq!(strip_byline_prefix("written by Priya Nair"), "Priya Nair");
        assert_eq!(strip_byline_prefix("Author Anita Rao"), "Anita Rao");
        assert_eq!(strip_byline_prefix("Byron Smith"), "Byron Smith");
    }

    #[test]
    fn test_collects_from_every_strategy() {
        let html = r#"<html><head>
            <meta name="author" content="Meta Author">
            <script type="application/ld+json">{"@type":"NewsArticle","author":{"@type":"Person","name":"Ld Author"}}</script>
            </head><body>
            <a rel="author" href="/x">Rel Author</a>
            <span itemprop="author"><span itemprop="name">Item Name</span><span>Extra</span></span>
            <div class="story-byline">By Class Byline</div>
            <a href="/profile/jane">Profile Link</a>
            <div data-author="Data Author"></div>
            <em class="writer-name">Known Class</em>
            </body></html>"#;
        let found = run(html);
        for expected in [
            "Ld Author",
            "Rel Author",
            "Item Name",
            "Meta Author",
            "Class Byline",
            "Profile Link",
            "Data Author",
            "Known Class",
        ] {
            assert!(found.iter().any(|f| f == expected), "missing {expected}: {found:?}");
        }
    }

    #[test]
    fn test_word_count_bounds() {
        let html = r#"<html><body>
            <span class="author">Single</span>
            <span class="author">One two three four five six seven</span>
            <span class="author">Two Words</span>
            </body></html>"#;
        assert_eq!(run(html), vec!["Two Words".to_string()]);
    }

    #[test]
    fn test_article_scoped_author_class() {
        let html = r#"<html><body><article>
            <p class="article-author-line">by Meera Iyer</p>
            </article></body></html>"#;
        assert!(run(html).contains(&"Meera Iyer".to_string()));
    }
}
