//! Author-name validation.
//!
//! Byline candidates are full of timestamps, desk names, outlet names and
//! photo credits. [`is_valid_author`] runs the rejection rules first and
//! then needs one positive signal that the string looks like a person's
//! name. Anything ambiguous is rejected.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

/// Date, time and freshness markers, matched against the lowercased name.
static DATE_TIME: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"\d{1,2}:\d{2}",
        r"\d{4}",
        r"\d{1,2}[/-]\d{1,2}",
        r"\b(jan(uary)?|feb(ruary)?|mar(ch)?|apr(il)?|may|june?|july?|aug(ust)?|sept?(ember)?|oct(ober)?|nov(ember)?|dec(ember)?)\b",
        r"\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
        r"\b\d+\s*(mins?|minutes?|hrs?|hours?|days?|weeks?)\b",
        r"\bago\b",
        r"\b(am|pm)\b",
        r"\b(updated|published|posted)\b",
    ])
    .expect("valid date/time patterns")
});

/// Boilerplate bylines, matched against the lowercased name.
static BOILERPLATE: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^(by|author|written by|posted by):?\s*$",
        r"^(the\s+)?([\w.&'-]+\s+){0,3}(bureau|desk|team|staff|newsroom)$",
        r"^\w+\s+(news|times|post)$",
        r"^(photos?|images?|videos?|graphics?|illustrations?)\b",
        r"(twitter|facebook|instagram|social media)",
        r"(^|\s)@\w+",
        r"contributed",
        r"^web\s+(desk|team)",
        r"^input",
    ])
    .expect("valid boilerplate patterns")
});

/// Agency-style abbreviations: one capitals token of up to five letters, or
/// several tokens of up to four ("PTI", "IANS AFP"). Names in capitals pass.
static ABBREVIATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{2,5}|[A-Z]{2,4}(\s+[A-Z]{2,4})+)$").expect("valid abbreviation regex")
});
static LETTER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Alphabetic}{2,}").expect("valid letter-run regex"));

/// Words that mark an organisation rather than a person in short bylines.
const ORG_IDENTIFIERS: &[&str] = &[
    "news", "times", "post", "daily", "weekly", "press", "media", "network", "broadcasting",
    "corporation", "bureau", "desk", "team", "staff", "editorial", "office", "group", "agency",
    "service", "channel", "tv", "radio", "online", "digital", "correspondent", "reporter",
    "newsroom",
];

/// Domain labels that say nothing about the outlet.
const GENERIC_DOMAIN_LABELS: &[&str] = &["www", "com", "in", "co", "uk", "org", "net", "gov", "edu", "news"];

const MAX_WORDS: usize = 6;
const CAPITALIZED_SHARE: f64 = 0.6;

/// Distinctive tokens of an outlet domain (`"timesofindia.indiatimes.com"`
/// gives `["timesofindia", "indiatimes"]`).
pub fn domain_tokens(outlet_domain: &str) -> Vec<String> {
    let host = outlet_domain.split(':').next().unwrap_or_default().to_lowercase();
    host.split(['.', '-'])
        .filter(|part| part.chars().count() > 2 && !GENERIC_DOMAIN_LABELS.contains(part))
        .map(str::to_string)
        .collect()
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Decide whether `name` plausibly names a person writing for `outlet_domain`.
///
/// ```ignore
/// assert!(is_valid_author("Rahul Sharma", "ndtv.com"));
/// assert!(!is_valid_author("Breaking News Desk", "ndtv.com"));
/// assert!(!is_valid_author("Updated: 10:30 AM", "ndtv.com"));
/// ```
pub fn is_valid_author(name: &str, outlet_domain: &str) -> bool {
    let name = name.trim();
    if name.chars().count() < 3 {
        return false;
    }
    let lower = name.to_lowercase();
    let words: Vec<&str> = name.split_whitespace().collect();
    let short = words.len() <= 2;

    if DATE_TIME.is_match(&lower) {
        return false;
    }

    if short && domain_tokens(outlet_domain).iter().any(|t| lower.contains(t.as_str())) {
        return false;
    }

    if short
        && lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| ORG_IDENTIFIERS.contains(&w))
    {
        return false;
    }

    if BOILERPLATE.is_match(&lower) || ABBREVIATION.is_match(name) {
        return false;
    }

    if words.len() > MAX_WORDS || !LETTER_RUN.is_match(name) {
        return false;
    }

    if words.len() >= 2 {
        let capitalized = words.iter().filter(|w| starts_uppercase(w)).count();
        if capitalized as f64 >= words.len() as f64 * CAPITALIZED_SHARE {
            return true;
        }
    }

    if words.len() == 1 && (3..=15).contains(&name.chars().count()) && starts_uppercase(name) {
        return true;
    }

    if name.contains(',') && words.len() >= 2 {
        return true;
    }

    (2..=4).contains(&words.len())
        && words.iter().all(|w| (3..=20).contains(&w.chars().count()))
}
