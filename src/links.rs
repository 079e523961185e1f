//! URL cleaning, article-likelihood scoring, and link discovery.
//!
//! Article detection is a path heuristic: known non-article paths are
//! rejected outright, everything else scores one point per article
//! indicator plus one for a path at least three segments deep.

use once_cell::sync::Lazy;
use regex::RegexSet;
use scraper::{Html, Selector};
use url::Url;

use crate::models::{ARTICLE_PRIORITY, FrontierEntry, NAVIGATION_PRIORITY};
use crate::utils::outlet_domain;

static AVOID_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"\.(jpg|jpeg|png|gif|webp|svg|pdf|zip|mp4|mp3|avi|mov)$",
        r"/(tag|tags|category|archive|login|register|subscribe|about|contact|privacy|terms)/",
        r"/page/\d+",
        r"[?&]page=\d+",
        r"#",
        r"[?&]share=",
        r"/feed/",
        r"/rss",
        r"/wp-admin/",
        r"/wp-content/",
        r"/search",
    ])
    .expect("valid avoid patterns")
});

static ARTICLE_INDICATORS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"/article/",
        r"/story/",
        r"/news/",
        r"/\d{4}/\d{2}/\d{2}/",
        r"/\d{4}/\d{2}/",
        r"-\d{6,}\.html",
        r"/post/",
        r"/blog/",
        r"/\d{8}/",
        r"/read/",
        r"/detail/",
        r"/p/",
        r"/opinion/",
        r"/analysis/",
        r"/feature/",
    ])
    .expect("valid article indicators")
});

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid link selector"));

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_")
        || matches!(
            key.as_str(),
            "fbclid" | "gclid" | "dclid" | "msclkid" | "igshid" | "mc_cid" | "mc_eid" | "ref" | "share"
        )
}

/// Drop the fragment, tracking parameters and empty values, then
/// re-serialize the query canonically.
pub fn clean_url(url: &Url) -> Url {
    let mut cleaned = url.clone();
    cleaned.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, v)| !v.is_empty() && !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned.query_pairs_mut().clear().extend_pairs(kept);
    }
    cleaned
}

/// [`clean_url`] on a string; `None` if it does not parse.
///
/// ```ignore
/// assert_eq!(
///     clean("https://site.com/a?utm_source=x&id=7#top").as_deref(),
///     Some("https://site.com/a?id=7"),
/// );
/// ```
pub fn clean(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| clean_url(&u).to_string())
}

/// Heuristic article-vs-navigation verdict for a URL.
pub fn is_likely_article(url: &str) -> bool {
    let lower = url.to_lowercase();
    if AVOID_PATTERNS.is_match(&lower) {
        return false;
    }

    let mut score = ARTICLE_INDICATORS.matches(&lower).iter().count();
    let path = Url::parse(&lower)
        .map(|u| u.path().to_string())
        .unwrap_or_default();
    if path.trim_matches('/').split('/').count() >= 3 {
        score += 1;
    }
    score > 0
}

/// Collect same-domain links from a parsed page.
///
/// Links are resolved against `page_url`, cleaned, restricted to http(s)
/// URLs whose outlet domain equals `base_domain`, filtered by `keep`
/// (the frontier's "not seen yet" test) and de-duplicated. Likely
/// articles come first, and at most `limit` entries are returned.
pub fn discover_links<F>(
    document: &Html,
    page_url: &Url,
    base_domain: &str,
    depth: usize,
    limit: usize,
    mut keep: F,
) -> Vec<FrontierEntry>
where
    F: FnMut(&str) -> bool,
{
    let mut articles = Vec::new();
    let mut navigation = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for anchor in document.select(&LINK_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = page_url.join(href.trim()) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        if outlet_domain(&resolved).as_deref() != Some(base_domain) {
            continue;
        }

        let cleaned = clean_url(&resolved).to_string();
        if !seen.insert(cleaned.clone()) || !keep(&cleaned) {
            continue;
        }

        if is_likely_article(&cleaned) {
            articles.push(FrontierEntry::new(cleaned, depth + 1, ARTICLE_PRIORITY));
        } else {
            navigation.push(FrontierEntry::new(cleaned, depth + 1, NAVIGATION_PRIORITY));
        }
    }

    articles.extend(navigation);
    articles.truncate(limit);
    articles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dated_story_is_article() {
        assert!(is_likely_article(
            "https://site.com/news/2024/05/10/city-fire-123456.html"
        ));
        assert!(is_likely_article("https://site.com/india/delhi/metro-expansion"));
    }

    #[test]
    fn test_navigation_paths_are_not_articles() {
        assert!(!is_likely_article("https://site.com/tag/politics/"));
        assert!(!is_likely_article("https://site.com/category/world/"));
        assert!(!is_likely_article("https://site.com/news/page/2"));
        assert!(!is_likely_article("https://site.com/images/photo.JPG"));
        assert!(!is_likely_article("https://site.com/search?q=fire"));
        assert!(!is_likely_article("https://site.com/"));
        assert!(!is_likely_article("https://site.com/sports"));
    }

    #[test]
    fn test_clean_strips_tracking_params_and_fragment() {
        let a = clean("https://site.com/story/fire?utm_source=tw&utm_campaign=x&id=7#comments").unwrap();
        let b = clean("https://site.com/story/fire?id=7&fbclid=abc").unwrap();
        assert_eq!(a, "https://site.com/story/fire?id=7");
        assert_eq!(a, b);
        assert_eq!(clean("https://site.com/story/fire?ref=home").unwrap(), "https://site.com/story/fire");
    }

    #[test]
    fn test_clean_is_idempotent() {
        for raw in [
            "https://Site.com:443/a/b?x=1&utm_medium=e&y=hello%20world",
            "http://site.com/a?q=caf%C3%A9&empty=",
            "https://site.com",
        ] {
            let once = clean(raw).unwrap();
            assert_eq!(clean(&once).unwrap(), once, "not a fixed point: {raw}");
        }
        assert!(clean("not a url").is_none());
    }

    #[test]
    fn test_discover_links_filters_and_orders() {
        let html = Html::parse_document(
            r##"<html><body>
                <a href="/sports">Sports</a>
                <a href="/news/2024/05/10/fire-123456.html?utm_source=home">Fire</a>
                <a href="https://www.site.com/story/flood">Flood</a>
                <a href="https://other.com/story/x">Elsewhere</a>
                <a href="mailto:desk@site.com">Mail</a>
                <a href="/news/2024/05/10/fire-123456.html#top">Fire again</a>
                <a href="/seen/already">Seen</a>
            </body></html>"##,
        );
        let page = Url::parse("https://site.com/").unwrap();
        let links = discover_links(&html, &page, "site.com", 0, 25, |u| !u.contains("/seen/"));

        let urls: Vec<_> = links.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://site.com/news/2024/05/10/fire-123456.html",
                "https://www.site.com/story/flood",
                "https://site.com/sports",
            ]
        );
        assert!(links[0].is_likely_article());
        assert!(!links[2].is_likely_article());
        assert!(links.iter().all(|e| e.depth == 1));
    }

    #[test]
    fn test_discover_links_respects_limit() {
        let body: String = (0..40)
            .map(|i| format!(r#"<a href="/story/item-{i}">x</a>"#))
            .collect();
        let html = Html::parse_document(&body);
        let page = Url::parse("https://site.com/").unwrap();
        let links = discover_links(&html, &page, "site.com", 2, 25, |_| true);
        assert_eq!(links.len(), 25);
        assert!(links.iter().all(|e| e.depth == 3));
    }
}
