//! Relevance re-ranking between lexical scores and answer selection.
//!
//! BM25 finds entries that share words with the query; this pass prefers
//! entries a medic can act on. Treatment text carries doses, drug names
//! and imperatives, front-matter carries contributor lists, and lexical
//! scores alone cannot tell them apart.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::corpus::CorpusStore;
use crate::index::tokenize;

static DOSAGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\s*(?:mg|mcg|g|ml|kg)").unwrap());

const MED_NAMES: &[&str] = &[
    "ketamine",
    "morphine",
    "fentanyl",
    "txa",
    "tranexamic",
    "epinephrine",
    "atropine",
];

const ACTION_VERBS: &[&str] = &[
    "give", "administer", "apply", "insert", "perform", "monitor", "check",
];

const HEADER_MARKERS: &[&str] = &[
    "introduction",
    "background",
    "contributors",
    "publication date",
];

/// Query-token synonym sets for the keyword fallback.
const TERM_VARIATIONS: &[(&str, &[&str])] = &[
    ("tbi", &["brain", "traumatic", "injury"]),
    ("ventilator", &["mechanical", "ventilation", "respiratory"]),
    ("trauma", &["traumatic", "injury", "emergency"]),
    ("anesthesia", &["anesthetic", "sedation", "intubation"]),
];

/// Actionability score for one entry text. Higher is more treatment-like.
pub fn density_score(text: &str) -> i32 {
    let text = text.to_lowercase();
    let mut score = 0;

    if DOSAGE_PATTERN.is_match(&text) {
        score += 3;
    }
    for med in MED_NAMES {
        if text.contains(med) {
            score += 2;
        }
    }
    for verb in ACTION_VERBS {
        if text.contains(verb) {
            score += 1;
        }
    }
    for marker in HEADER_MARKERS {
        if text.contains(marker) {
            score -= 2;
        }
    }
    if text.len() < 50 {
        score -= 3;
    }
    score
}

/// Re-order ranked doc ids by actionability. Stable: equal densities keep
/// the incoming (lexical) order. Nothing is dropped here.
pub fn rank_by_density(corpus: &CorpusStore, hits: &[usize]) -> Vec<usize> {
    let mut scored: Vec<(i32, usize)> = hits
        .iter()
        .filter_map(|&id| corpus.get(id).map(|entry| (density_score(&entry.text), id)))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, id)| id).collect()
}

/// Last-resort keyword overlap over the whole corpus.
///
/// Matches content words only, so filler like "the" cannot drag in
/// unrelated guidelines. Source titles weigh more than body text,
/// sections less. Only entries with a positive score qualify; ties
/// keep corpus order.
pub fn keyword_fallback(corpus: &CorpusStore, query: &str, top_n: usize) -> Vec<usize> {
    let query_words = tokenize(query);
    if query_words.is_empty() {
        return vec![];
    }

    let mut scored: Vec<(i32, usize)> = Vec::new();
    for (id, entry) in corpus.entries().iter().enumerate() {
        let text = entry.text.to_lowercase();
        let source = entry.source.to_lowercase();
        let section = entry.section.to_lowercase();

        let mut score = 0;
        for word in &query_words {
            if text.contains(word.as_str()) {
                score += 2;
            }
            if source.contains(word.as_str()) {
                score += 3;
            }
            if section.contains(word.as_str()) {
                score += 1;
            }
        }
        for (term, variations) in TERM_VARIATIONS {
            if query_words.iter().any(|w| w == term) {
                for var in *variations {
                    if text.contains(var) || source.contains(var) {
                        score += 2;
                    }
                }
            }
        }

        if score > 0 {
            scored.push((score, id));
        }
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(top_n);
    scored.into_iter().map(|(_, id)| id).collect()
}
