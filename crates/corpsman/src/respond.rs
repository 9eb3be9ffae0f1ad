//! Response composition.
//!
//! Turns a [`Decision`] into one spoken reply: dedup, cap at two action
//! points, keep sentences short enough to say aloud. Contraindication
//! warnings and the missing-vitals reminder ride outside the cap so
//! safety text never crowds out the answer.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::resolver::{Decision, Recommendation};

/// Spoken action points per reply.
const MAX_ACTION_POINTS: usize = 2;

/// Longest procedural sentence worth speaking before truncation.
const MAX_POINT_CHARS: usize = 100;

/// Character budget for a retrieved guideline answer.
const MAX_GUIDELINE_CHARS: usize = 300;

/// Verbs that mark a sentence as an instruction rather than preamble.
const ANSWER_VERBS: &[&str] = &[
    "give",
    "administer",
    "apply",
    "insert",
    "perform",
    "monitor",
    "check",
];

/// Front-matter that guideline PDFs drag along and nobody wants read
/// out loud.
static BOILERPLATE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)clinical practice guideline\s*(?:id:?\s*\S+)?").unwrap(),
        Regex::new(r"(?i)\bcpg\s*id:?\s*\S+").unwrap(),
        Regex::new(r"(?i)\bcontributors?:[^.]*\.?").unwrap(),
        Regex::new(r"(?i)\bpublication date:?[^.]*\.?").unwrap(),
    ]
});

static LEADING_BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[•\-*]\s*").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn clean_point(text: &str) -> String {
    let text = LEADING_BULLET_RE.replace(text, "");
    WHITESPACE_RE.replace_all(text.trim(), " ").to_string()
}

fn dedup_key(text: &str) -> String {
    WHITESPACE_RE
        .replace_all(&text.to_lowercase(), " ")
        .trim()
        .to_string()
}

fn truncate_point(text: String) -> String {
    if text.len() <= MAX_POINT_CHARS {
        return text;
    }
    let mut end = MAX_POINT_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    // Back up to a word boundary; half a word is unreadable aloud.
    let cut = match text[..end].rfind(' ') {
        Some(pos) if pos > 0 => pos,
        _ => end,
    };
    format!("{}...", text[..cut].trim_end())
}

fn finish_sentence(mut text: String) -> String {
    if !text.ends_with('.') && !text.ends_with('?') {
        text.push('.');
    }
    text
}

/// Compose the spoken reply for one decision.
pub fn compose(decision: &Decision) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for rec in &decision.recommendations {
        if parts.len() >= MAX_ACTION_POINTS {
            break;
        }
        match rec {
            Recommendation::Medication { name, text } => {
                // Dose sentences are never truncated. A cut-off dose is
                // worse than a long one.
                let key = format!("{name}:{}", dedup_key(text));
                if seen.insert(key) {
                    parts.push(clean_point(text));
                }
            }
            Recommendation::Procedure { text, priority, .. } => {
                if !priority.actionable() {
                    continue;
                }
                let cleaned = clean_point(text);
                if seen.insert(dedup_key(&cleaned)) {
                    parts.push(truncate_point(cleaned));
                }
            }
            Recommendation::Note { text } => {
                let cleaned = clean_point(text);
                if seen.insert(dedup_key(&cleaned)) {
                    parts.push(cleaned);
                }
            }
        }
    }

    let mut response = if parts.is_empty() {
        "Consult guidelines for specific protocols.".to_string()
    } else {
        // Each part becomes a finished sentence before joining, so
        // ellipses and question marks survive untouched.
        parts
            .into_iter()
            .map(finish_sentence)
            .collect::<Vec<_>>()
            .join(" ")
    };

    if let Some(warnings) = &decision.warnings {
        response.push_str(&format!(" Warning: {warnings}."));
    }
    if decision.needs_vitals {
        response.push_str(" No vitals recorded. Please provide current vitals.");
    }
    response
}

/// Pull a speakable answer out of a retrieved guideline paragraph.
/// Prefer the first instruction sentence; otherwise strip front-matter
/// and keep the opening within the character budget.
pub fn answer_from_guideline(text: &str) -> String {
    let mut cleaned = text.to_string();
    for re in BOILERPLATE_RES.iter() {
        cleaned = re.replace_all(&cleaned, " ").to_string();
    }
    let cleaned = WHITESPACE_RE.replace_all(cleaned.trim(), " ").to_string();

    for sentence in cleaned.split(". ") {
        let lower = sentence.to_lowercase();
        if ANSWER_VERBS.iter().any(|v| lower.contains(v)) {
            let sentence = sentence.trim().trim_end_matches('.');
            if !sentence.is_empty() {
                return format!("{sentence}.");
            }
        }
    }

    summarize(&cleaned)
}

fn summarize(text: &str) -> String {
    if text.len() <= MAX_GUIDELINE_CHARS {
        return text.to_string();
    }
    let sentences: Vec<&str> = text.split(". ").collect();
    if sentences.len() >= 2 {
        let lead = format!(
            "{}. {}.",
            sentences[0].trim_end_matches('.'),
            sentences[1].trim_end_matches('.')
        );
        if lead.len() <= MAX_GUIDELINE_CHARS {
            return lead;
        }
    }
    let mut end = MAX_GUIDELINE_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", text[..end].trim_end())
}
