//! Per-page work that runs on the blocking pool.
//!
//! `scraper::Html` is not `Send`, so a page is parsed, mined for links and
//! facts, and dropped inside one blocking closure. Only plain data crosses
//! back to the async worker.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Local;
use scraper::Html;
use tracing::{debug, info};
use url::Url;

use crate::classify::{self, LanguagePipeline};
use crate::extract::{extract_document, strip_byline_prefix};
use crate::links::{discover_links, is_likely_article};
use crate::models::{ArticleRecord, CrawlJob, FrontierEntry};
use crate::store::DomainState;
use crate::utils::truncate_for_log;
use crate::validate::is_valid_author;

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const LOG_HEADLINE_CHARS: usize = 60;

/// Everything the blocking closure needs, cheap to clone.
#[derive(Clone)]
pub(crate) struct PageContext {
    pub job: Arc<CrawlJob>,
    pub state: Arc<DomainState>,
    pub pipeline: Option<Arc<dyn LanguagePipeline>>,
    pub links_per_page: usize,
}

#[derive(Debug, Default)]
pub(crate) struct PageOutcome {
    pub links: Vec<FrontierEntry>,
    pub written: usize,
}

/// Discover links and mine facts from one fetched page.
///
/// `unseen` is the frontier's membership test, applied before the per-page
/// link cap so the cap is spent on new URLs.
pub(crate) fn process_page<F>(
    ctx: &PageContext,
    entry: &FrontierEntry,
    page_url: &Url,
    body: &str,
    unseen: F,
) -> PageOutcome
where
    F: FnMut(&str) -> bool,
{
    let document = Html::parse_document(body);
    let job = &ctx.job;

    let links = if entry.depth < job.max_depth {
        discover_links(
            &document,
            page_url,
            &job.outlet_domain,
            entry.depth,
            ctx.links_per_page,
            unseen,
        )
    } else {
        Vec::new()
    };

    let written = if entry.depth == 0 || is_likely_article(&entry.url) {
        mine_article(ctx, &document, &entry.url)
    } else {
        0
    };

    PageOutcome { links, written }
}

/// Record every validated (author, headline) fact on an article page.
pub(crate) fn mine_article(ctx: &PageContext, document: &Html, url: &str) -> usize {
    let job = &ctx.job;
    let extraction = extract_document(document);

    let Some(headline) = extraction.headline else {
        debug!(url, "No headline; skipping page");
        return 0;
    };

    let authors: BTreeSet<String> = extraction
        .author_candidates
        .iter()
        .map(|candidate| strip_byline_prefix(candidate))
        .filter(|name| is_valid_author(name, &job.outlet_domain))
        .collect();
    if authors.is_empty() {
        debug!(url, candidates = extraction.author_candidates.len(), "No valid author; skipping page");
        return 0;
    }

    let keywords = classify::keywords(&headline, ctx.pipeline.as_deref());
    let topics = classify::topics(&headline, &keywords);
    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

    let mut written = 0;
    for author in authors {
        if ctx.state.count() >= job.max_articles {
            break;
        }
        let record = ArticleRecord {
            author,
            headline: headline.clone(),
            keywords: keywords.clone(),
            topics: topics.clone(),
            url: url.to_string(),
            outlet: job.outlet_name.clone(),
            timestamp: timestamp.clone(),
        };
        if ctx.state.record(&record, job.max_articles) {
            written += 1;
            info!(
                count = ctx.state.count(),
                "✓ [{}] {} | {}",
                job.outlet_domain,
                record.author,
                truncate_for_log(&record.headline, LOG_HEADLINE_CHARS)
            );
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::dataset;
    use crate::store::DomainRegistry;
    use tempfile::tempdir;

    fn context(dir: &std::path::Path, max_articles: usize, max_depth: usize) -> PageContext {
        let job = CrawlJob::new("https://www.citynews.com/", "City News", max_articles, 2, max_depth)
            .unwrap();
        let registry = DomainRegistry::new(dir);
        PageContext {
            state: registry.state(&job.outlet_domain),
            job: Arc::new(job),
            pipeline: None,
            links_per_page: 25,
        }
    }

    const ARTICLE: &str = r#"<html><head>
        <title>Fire breaks out in old market | City News</title>
        <meta name="author" content="Rahul Sharma">
        </head><body><article>
        <span class="byline">By Priya Nair</span>
        <span class="author">City News Desk</span>
        <a href="/news/2024/05/10/next-story-100002.html">Next</a>
        <a href="/tag/fire/">Fire</a>
        <a href="https://other.com/news/2024/05/10/x-1.html">Elsewhere</a>
        </article></body></html>"#;

    #[test]
    fn test_mine_article_records_valid_authors_only() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), 10, 2);
        let document = Html::parse_document(ARTICLE);

        let written = mine_article(&ctx, &document, "https://citynews.com/news/a-1.html");
        assert_eq!(written, 2);
        assert!(ctx.state.has_seen("Rahul Sharma", "Fire breaks out in old market"));
        assert!(ctx.state.has_seen("Priya Nair", "Fire breaks out in old market"));

        let again = mine_article(&ctx, &document, "https://citynews.com/news/a-1.html?x=1");
        assert_eq!(again, 0);
        assert_eq!(dataset::row_count(ctx.state.path()).unwrap(), 2);
    }

    #[test]
    fn test_mine_article_respects_quota() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), 1, 2);
        let document = Html::parse_document(ARTICLE);
        assert_eq!(mine_article(&ctx, &document, "https://citynews.com/news/a-1.html"), 1);
        assert_eq!(ctx.state.count(), 1);
    }

    #[test]
    fn test_process_page_links_and_depth() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), 10, 2);
        let page_url = Url::parse("https://citynews.com/").unwrap();

        let home = FrontierEntry::new("https://citynews.com/", 0, 1);
        let outcome = process_page(&ctx, &home, &page_url, ARTICLE, |_| true);
        let urls: Vec<&str> = outcome.links.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://citynews.com/news/2024/05/10/next-story-100002.html",
                "https://citynews.com/tag/fire/"
            ]
        );
        assert!(outcome.links.iter().all(|e| e.depth == 1));
        assert_eq!(outcome.written, 2);

    }

    #[test]
    fn test_process_page_mines_only_articles_below_homepage() {
        let nav_dir = tempdir().unwrap();
        let ctx = context(nav_dir.path(), 10, 2);
        let page_url = Url::parse("https://citynews.com/sports").unwrap();

        let section = FrontierEntry::new("https://citynews.com/sports", 2, 1);
        let outcome = process_page(&ctx, &section, &page_url, ARTICLE, |_| true);
        assert!(outcome.links.is_empty());
        assert_eq!(outcome.written, 0, "navigation page is not mined");
        assert_eq!(ctx.state.count(), 0);

        let story_dir = tempdir().unwrap();
        let ctx = context(story_dir.path(), 10, 2);
        let story = FrontierEntry::new("https://citynews.com/news/2024/05/10/next-story-100002.html", 2, 1);
        let outcome = process_page(&ctx, &story, &page_url, ARTICLE, |_| true);
        assert!(outcome.links.is_empty());
        assert_eq!(outcome.written, 2);
    }
}
