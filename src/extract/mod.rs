//! Headline and byline extraction from fetched HTML.
//!
//! Extraction works on arbitrary, often inconsistent markup, so every
//! strategy is allowed to come up empty:
//!
//! | Part | Module | Rule |
//! |------|--------|------|
//! | Structured data | [`jsonld`] | Parsed once per page, shared by both passes |
//! | Headline | [`headline`] | Ordered cascade, first usable result wins |
//! | Authors | [`authors`] | Union of every strategy, 2–6 words each |
//!
//! A page that yields no headline is not an error; the caller simply skips it.

use std::collections::BTreeSet;

use scraper::{ElementRef, Html};

pub mod authors;
pub mod headline;
mod jsonld;

pub use authors::strip_byline_prefix;
pub use headline::title_segment;

/// What a page offers before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub headline: Option<String>,
    pub author_candidates: BTreeSet<String>,
}

/// Parse `html` and extract from it.
pub fn extract(html: &str) -> Extraction {
    extract_document(&Html::parse_document(html))
}

/// Extract from an already parsed page.
pub fn extract_document(document: &Html) -> Extraction {
    let blocks = jsonld::blocks(document);
    Extraction {
        headline: headline::headline(document, &blocks),
        author_candidates: authors::candidates(document, &blocks),
    }
}

/// Text of an element with its text nodes joined by spaces.
pub(crate) fn element_text(el: &ElementRef<'_>) -> String {
    crate::utils::normalize_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}
