//! Keyword and topic classification of headlines.
//!
//! Keywords come from a pluggable [`LanguagePipeline`] when one is
//! configured and from a deterministic frequency count otherwise. Topics are
//! a fixed taxonomy matched against the words of the headline and keywords.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::utils::title_case;

pub const MAX_KEYWORDS: usize = 10;
pub const DEFAULT_TOPIC: &str = "General";

const ENTITY_LABELS: [&str; 7] = ["PERSON", "ORG", "GPE", "LOC", "EVENT", "PRODUCT", "NORP"];
const KEYWORD_POS: [&str; 2] = ["NOUN", "PROPN"];

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "as", "is", "was", "are", "been", "be", "have", "has", "had", "do", "does", "did",
        "will", "would", "could", "should", "may", "might", "must", "can", "this", "that",
        "these", "those",
    ]
    .into_iter()
    .collect()
});

static KEYWORD_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b|\b[a-z]{4,}\b").expect("valid keyword regex")
});

/// Topic labels in output order, each with its trigger words.
pub const TAXONOMY: &[(&str, &[&str])] = &[
    ("Politics", &["election", "government", "minister", "parliament", "policy", "vote", "president", "congress", "senate", "political"]),
    ("Economy", &["economy", "market", "business", "finance", "stock", "trade", "gdp", "inflation", "bank", "economic"]),
    ("Technology", &["technology", "tech", "ai", "digital", "software", "internet", "cyber", "app", "innovation", "startup"]),
    ("Health", &["health", "medical", "hospital", "disease", "treatment", "doctor", "patient", "medicine", "covid", "vaccine"]),
    ("Sports", &["sport", "cricket", "football", "match", "player", "team", "championship", "olympic", "tournament", "game"]),
    ("Entertainment", &["entertainment", "movie", "film", "actor", "music", "celebrity", "show", "series", "bollywood", "hollywood"]),
    ("Environment", &["climate", "environment", "pollution", "green", "sustainability", "energy", "renewable", "carbon", "nature"]),
    ("Crime", &["crime", "police", "arrest", "court", "murder", "theft", "investigation", "law", "justice", "trial"]),
    ("Education", &["education", "school", "university", "student", "exam", "teacher", "learning", "college", "academic"]),
    ("International", &["international", "world", "global", "foreign", "country", "nation", "embassy", "diplomatic", "war"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Universal part-of-speech tag (`NOUN`, `PROPN`, ...).
    pub pos: String,
    pub is_stop: bool,
}

/// Linguistic annotation of one headline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub entities: Vec<Entity>,
    pub noun_chunks: Vec<String>,
    pub tokens: Vec<Token>,
}

/// A part-of-speech tagger and entity recognizer.
///
/// Implementations are shared across workers. The input is already
/// lowercased.
pub trait LanguagePipeline: Send + Sync {
    fn annotate(&self, text: &str) -> Result<Annotation, PipelineError>;
}

/// Up to ten keywords for a headline, unique case-insensitively.
pub fn keywords(headline: &str, pipeline: Option<&dyn LanguagePipeline>) -> Vec<String> {
    if headline.trim().is_empty() {
        return Vec::new();
    }
    if let Some(pipeline) = pipeline {
        match pipeline.annotate(&headline.to_lowercase()) {
            Ok(annotation) => {
                let found = keywords_from_annotation(&annotation);
                if !found.is_empty() {
                    return found;
                }
                debug!("language pipeline found no keywords; using fallback");
            }
            Err(e) => warn!(error = %e, "keyword extraction failed; using fallback"),
        }
    }
    fallback_keywords(headline)
}

fn keywords_from_annotation(annotation: &Annotation) -> Vec<String> {
    let entities = annotation
        .entities
        .iter()
        .filter(|e| ENTITY_LABELS.contains(&e.label.as_str()))
        .map(|e| e.text.trim().to_string());

    let chunks = annotation
        .noun_chunks
        .iter()
        .map(|c| c.trim())
        .filter(|c| {
            let words: Vec<&str> = c.split_whitespace().collect();
            (2..=4).contains(&words.len())
                && !words.iter().all(|w| STOPWORDS.contains(w.to_lowercase().as_str()))
        })
        .map(str::to_string);

    let tokens = annotation
        .tokens
        .iter()
        .filter(|t| {
            KEYWORD_POS.contains(&t.pos.as_str())
                && !t.is_stop
                && t.text.chars().count() > 3
                && t.text.chars().all(char::is_alphabetic)
        })
        .map(|t| t.text.clone());

    entities
        .chain(chunks)
        .chain(tokens)
        .filter(|k| !k.is_empty())
        .map(|k| title_case(&k))
        .unique_by(|k| k.to_lowercase())
        .take(MAX_KEYWORDS)
        .collect()
}

/// Capitalized runs and long lowercase words, ranked by frequency.
///
/// Ties keep first-occurrence order, so the output is deterministic.
pub fn fallback_keywords(headline: &str) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for m in KEYWORD_CANDIDATE.find_iter(headline) {
        let word = m.as_str();
        if word.chars().count() <= 3 || STOPWORDS.contains(word.to_lowercase().as_str()) {
            continue;
        }
        let word = title_case(word);
        let count = counts.entry(word.clone()).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }

    order
        .into_iter()
        .enumerate()
        .sorted_by_key(|(i, w)| (std::cmp::Reverse(counts[w]), *i))
        .map(|(_, w)| w)
        .take(MAX_KEYWORDS)
        .collect()
}

/// Topic labels in taxonomy order, `["General"]` when nothing matches.
pub fn topics(headline: &str, keywords: &[String]) -> Vec<String> {
    let words: HashSet<String> = std::iter::once(headline)
        .chain(keywords.iter().map(String::as_str))
        .flat_map(|text| text.split(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    let matched: Vec<String> = TAXONOMY
        .iter()
        .filter(|(_, triggers)| {
            triggers
                .iter()
                .any(|t| words.contains(*t) || words.contains(&format!("{t}s")))
        })
        .map(|(label, _)| (*label).to_string())
        .collect();

    if matched.is_empty() {
        vec![DEFAULT_TOPIC.to_string()]
    } else {
        matched
    }
}
