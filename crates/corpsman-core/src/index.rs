//! Lexical ranking over the guideline corpus.
//!
//! Okapi BM25 over an inverted index built once at startup. Deterministic:
//! equal scores keep corpus order, so the same corpus and query always
//! produce the same ranking.

use std::collections::HashMap;

use crate::corpus::CorpusStore;

const K1: f32 = 1.5;
const B: f32 = 0.75;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will", "would",
    "could", "should", "may", "might", "can", "this", "that", "these", "those", "i", "you", "he",
    "she", "it", "we", "they", "me", "him", "her", "us", "them",
];

/// Tokenize text into searchable tokens (deterministic).
///
/// Lowercases, strips punctuation, drops stop words and tokens of one or
/// two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter_map(|raw| {
            let clean: String = raw.chars().filter(|c| c.is_alphanumeric() || *c == '_').collect();
            if clean.len() > 2 && !STOP_WORDS.contains(&clean.as_str()) {
                Some(clean)
            } else {
                None
            }
        })
        .collect()
}

/// Posting list for one term: (doc id, term frequency) in corpus order.
#[derive(Debug, Clone, Default)]
struct Posting {
    docs: Vec<(usize, u32)>,
}

/// BM25 index over the corpus. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct LexicalIndex {
    postings: HashMap<String, Posting>,
    doc_lengths: Vec<u32>,
    avg_doc_len: f32,
}

impl LexicalIndex {
    /// Build the index from every corpus entry, in corpus order.
    pub fn build(corpus: &CorpusStore) -> Self {
        let mut postings: HashMap<String, Posting> = HashMap::new();
        let mut doc_lengths = Vec::with_capacity(corpus.len());

        for (doc_id, entry) in corpus.entries().iter().enumerate() {
            let tokens = tokenize(&entry.text);
            doc_lengths.push(tokens.len() as u32);

            let mut term_counts: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *term_counts.entry(token).or_insert(0) += 1;
            }
            for (token, freq) in term_counts {
                postings.entry(token).or_default().docs.push((doc_id, freq));
            }
        }

        let total: u32 = doc_lengths.iter().sum();
        let avg_doc_len = if doc_lengths.is_empty() {
            0.0
        } else {
            total as f32 / doc_lengths.len() as f32
        };

        Self {
            postings,
            doc_lengths,
            avg_doc_len,
        }
    }

    pub fn doc_count(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn avg_doc_len(&self) -> f32 {
        self.avg_doc_len
    }

    /// Rank documents for a pre-tokenized query.
    ///
    /// Returns up to `top_n` (doc id, score) pairs with positive scores,
    /// best first. Query terms absent from the corpus contribute nothing;
    /// repeated query terms contribute once per repetition. Ties keep
    /// corpus order.
    pub fn query_tokens(&self, query_tokens: &[String], top_n: usize) -> Vec<(usize, f32)> {
        if query_tokens.is_empty() || self.doc_lengths.is_empty() {
            return vec![];
        }

        let n = self.doc_count() as f32;
        let mut scores = vec![0.0f32; self.doc_lengths.len()];
        let mut touched = false;

        for term in query_tokens {
            let Some(posting) = self.postings.get(term) else {
                continue;
            };
            touched = true;
            let df = posting.docs.len() as f32;
            let idf = ((n - df + 0.5) / (df + 0.5)).ln();

            for &(doc_id, tf) in &posting.docs {
                let doc_len = self.doc_lengths[doc_id] as f32;
                let norm = 1.0 - B + B * (doc_len / self.avg_doc_len.max(1.0));
                let tf_score = (tf as f32 * (K1 + 1.0)) / (tf as f32 + K1 * norm);
                scores[doc_id] += idf * tf_score;
            }
        }

        if !touched {
            return vec![];
        }

        // Ascending doc id before the stable sort keeps ties in corpus order.
        let mut ranked: Vec<(usize, f32)> = scores
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_n);
        ranked
    }

    /// Tokenize and rank in one step.
    pub fn search(&self, query: &str, top_n: usize) -> Vec<(usize, f32)> {
        self.query_tokens(&tokenize(query), top_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusEntry;
    use approx::assert_relative_eq;

    fn entry(text: &str) -> CorpusEntry {
        CorpusEntry {
            text: text.to_string(),
            source: "Test Guide".to_string(),
            section: String::new(),
            category: String::new(),
            page: 0,
            priority_score: 0.0,
        }
    }

    fn index_of(texts: &[&str]) -> LexicalIndex {
        let store = CorpusStore::from_entries(texts.iter().map(|t| entry(t)).collect());
        LexicalIndex::build(&store)
    }

    #[test]
    fn test_tokenize_filters_noise() {
        let tokens = tokenize("The patient is bleeding, apply a tourniquet!");
        assert_eq!(tokens, vec!["patient", "bleeding", "apply", "tourniquet"]);
    }

    #[test]
    fn test_tokenize_drops_short_tokens() {
        let tokens = tokenize("IV mg of TXA");
        // "iv" and "of" drop, "txa" survives punctuation-free
        assert_eq!(tokens, vec!["txa"]);
    }

    #[test]
    fn test_exact_match_ranks_first() {
        let idx = index_of(&[
            "tourniquet application for extremity bleeding control",
            "morphine dosing reference card",
            "general triage notes overview",
        ]);
        let hits = idx.search("tourniquet bleeding", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 0);
    }

    #[test]
    fn test_bm25_score_value() {
        let idx = index_of(&[
            "tourniquet application for extremity bleeding control",
            "morphine dosing reference card",
            "general triage notes overview",
        ]);
        // Both query terms: df = 1 of 3, idf = ln(2.5/1.5).
        // Doc lengths are 5, 4, 4 after stop-word removal, so avg is 13/3.
        let hits = idx.search("tourniquet bleeding", 5);
        let idf = (2.5f32 / 1.5).ln();
        let norm = 1.0 - 0.75 + 0.75 * (5.0 / (13.0 / 3.0));
        let per_term = idf * (1.0 * 2.5) / (1.0 + 1.5 * norm);
        assert_relative_eq!(hits[0].1, 2.0 * per_term, max_relative = 1e-5);
    }

    #[test]
    fn test_unknown_terms_return_empty() {
        let idx = index_of(&["tourniquet application", "morphine dosing"]);
        assert!(idx.search("xylophone concert", 5).is_empty());
        assert!(idx.search("", 5).is_empty());
        // Stop words only is the same as an empty query.
        assert!(idx.search("the and of", 5).is_empty());
    }

    #[test]
    fn test_common_terms_can_score_negative_and_drop() {
        // "guideline" appears in 2 of 3 docs, idf = ln(1.5/2.5) < 0, so a
        // query made only of it yields no positive scores.
        let idx = index_of(&[
            "guideline for airway management",
            "guideline for burn care",
            "unrelated triage notes",
        ]);
        assert!(idx.search("guideline", 5).is_empty());
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        // Filler docs keep the shared terms rare enough for positive idf.
        let idx = index_of(&[
            "needle decompression procedure",
            "needle decompression procedure",
            "needle decompression procedure",
            "ketamine dosing overview",
            "burn care notes",
            "triage priority review",
            "fracture splinting steps",
        ]);
        let hits = idx.search("needle decompression", 5);
        let ids: Vec<usize> = hits.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_top_n_truncates() {
        let idx = index_of(&[
            "hemorrhage control basics",
            "hemorrhage control advanced",
            "hemorrhage control review",
            "airway management notes",
            "burn care overview",
            "triage category reference",
            "fracture splinting steps",
        ]);
        assert_eq!(idx.search("hemorrhage", 2).len(), 2);
    }

    #[test]
    fn test_repeated_query_terms_accumulate() {
        let idx = index_of(&[
            "ketamine analgesia dosing",
            "morphine analgesia dosing",
            "triage category overview",
        ]);
        let single = idx.search("ketamine", 5);
        let double = idx.search("ketamine ketamine", 5);
        assert_eq!(single[0].0, double[0].0);
        assert_relative_eq!(double[0].1, 2.0 * single[0].1, max_relative = 1e-5);
    }

    #[test]
    fn test_doc_term_frequency_raises_score() {
        // Two docs of equal token length, differing only in how often the
        // query term repeats inside them. Fillers keep idf positive.
        let idx = index_of(&[
            "ketamine analgesia dosing",
            "ketamine ketamine dosing",
            "burn care notes",
            "triage priority review",
            "fracture splinting steps",
        ]);
        let hits = idx.search("ketamine", 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[1].0, 0);
        assert!(hits[0].1 > hits[1].1);
        // Every doc length equals the average, so norm is 1 and the tf
        // factor is tf * 2.5 / (tf + 1.5): tf = 2 scores 10/7 of tf = 1.
        assert_relative_eq!(hits[0].1, hits[1].1 * 10.0 / 7.0, max_relative = 1e-5);
    }
}
