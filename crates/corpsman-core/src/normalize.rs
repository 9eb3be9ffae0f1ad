//! Query normalization and medical-term expansion.
//!
//! Two passes with different audiences. `normalize` repairs the transcript
//! and canonicalizes units and vital names; its output drives context
//! extraction and rule dispatch. `expand` appends retrieval-only synonym
//! and context terms; its output goes to the ranker and nowhere else, so
//! expansion vocabulary cannot leak into dispatch decisions.

/// Transcript repairs. Applied in one left-to-right pass over word-aligned
/// sites: the first matching entry wins and its output is never rescanned,
/// so longer patterns sit before their substrings and replacements are
/// final forms. Word alignment keeps "he to" out of "the tourniquet".
const CORRECTIONS: &[(&str, &str)] = &[
    ("he to", "need to"),
    ("you to", "need to"),
    ("got a", "have a"),
    ("packing the womb", "uterine packing"),
    ("packing womb", "uterine packing"),
    ("packing", "wound packing"),
    ("womb", "uterine"),
    ("uterus", "uterine"),
    ("bleeding badly", "severe bleeding"),
    ("bleeding bad", "severe bleeding"),
    ("what about", ""),
    ("what other", "additional"),
    ("other medication", "additional medications"),
    ("other meds", "additional medications"),
    ("should i give", "administer"),
    ("need to give", "administer"),
    ("want to give", "administer"),
    ("going to give", "administer"),
    // Spoken units to the forms the extraction patterns expect.
    ("kilograms", "kg"),
    ("kilos", "kg"),
    ("kgs", "kg"),
    ("milligrams", "mg"),
    ("mgs", "mg"),
    ("micrograms", "mcg"),
    ("mcgs", "mcg"),
    ("milliliters", "ml"),
    ("mls", "ml"),
    ("grams", "g"),
    // Spoken vital names to their charted abbreviations.
    ("heart rate", "hr"),
    ("respiratory rate", "rr"),
    ("resp rate", "rr"),
    ("oxygen saturation", "spo2"),
    ("oxygen sat", "spo2"),
    ("o2 sat", "spo2"),
    ("temperature", "temp"),
    ("blood pressure", "bp"),
];

/// Words that mark a stray "cs" as acute coronary syndrome.
const ACS_INDICATORS: &[&str] = &[
    "symptoms", "patient", "having", "acute", "coronary", "heart", "chest", "pain",
];

/// Topic context terms appended for retrieval when the trigger appears.
const CONTEXT_EXPANSIONS: &[(&str, &str)] = &[
    ("bleeding", "hemorrhage blood loss"),
    ("wound", "laceration injury"),
    ("pain", "analgesia analgesic"),
    ("airway", "intubation ventilation"),
    ("shock", "hypotension hypovolemia"),
    ("fracture", "bone orthopedic"),
    ("burn", "thermal chemical"),
    ("chest", "thoracic pneumothorax"),
    ("abdomen", "abdominal laparotomy"),
    ("head", "neurological brain"),
    ("obstetric", "pregnancy delivery"),
    ("gynecological", "uterine vaginal"),
];

/// Synonym strings appended for retrieval, checked against the growing
/// query so earlier expansions can cue later ones.
const SYNONYM_EXPANSIONS: &[(&str, &str)] = &[
    ("ketamine", "ketamine analgesia sedation"),
    ("morphine", "morphine analgesia pain"),
    ("fentanyl", "fentanyl analgesia pain"),
    ("txa", "tranexamic acid hemorrhage"),
    ("tranexamic", "tranexamic acid hemorrhage"),
    ("epinephrine", "epinephrine cardiac arrest"),
    ("atropine", "atropine bradycardia"),
    ("blood", "blood transfusion hemorrhage"),
    ("transfusion", "blood transfusion whole blood"),
    ("whole blood", "blood transfusion whole blood packed red"),
    ("packed red", "packed red blood cells transfusion"),
    ("prbc", "packed red blood cells transfusion"),
    ("bleeding", "hemorrhage bleeding control"),
    ("hemorrhage", "hemorrhage bleeding control"),
    ("airway", "airway management intubation"),
    ("intubation", "airway management intubation"),
    ("chest tube", "thoracostomy chest tube"),
    ("thoracotomy", "emergency thoracotomy"),
    ("tourniquet", "tourniquet hemorrhage control"),
    ("pressure", "pressure dressing hemorrhage"),
    ("packing", "wound packing hemorrhage"),
    ("uterine", "uterine hemorrhage obstetric"),
    ("obstetric", "obstetric hemorrhage pregnancy"),
    ("pregnancy", "obstetric hemorrhage pregnancy"),
    ("delivery", "obstetric delivery pregnancy"),
    ("burn", "burn management thermal"),
    ("shock", "shock resuscitation hypotension"),
    ("cardiac", "cardiac arrest resuscitation"),
    ("arrest", "cardiac arrest resuscitation"),
    ("cpr", "cardiac arrest resuscitation"),
    ("seizure", "seizure management anticonvulsant"),
    ("infection", "infection antibiotic sepsis"),
    ("sepsis", "sepsis infection antibiotic"),
    ("acs", "acute coronary syndrome myocardial infarction"),
    ("acute coronary", "acute coronary syndrome myocardial infarction"),
    ("chest pain", "acute coronary syndrome myocardial infarction"),
    ("heart attack", "myocardial infarction acute coronary syndrome"),
    ("mi", "myocardial infarction acute coronary syndrome"),
    ("pelvis", "pelvic fracture trauma orthopedic"),
    ("pelvic", "pelvic fracture trauma orthopedic"),
    ("fracture", "orthopedic trauma bone extremity"),
    ("trauma", "trauma orthopedic fracture extremity"),
    ("amputation", "amputation trauma extremity hemorrhage"),
];

/// True when `term` occurs in `text` starting at a word boundary.
///
/// Prefix matching on purpose: "burned" should trigger the "burn"
/// expansion, but "administer" must not trigger "mi".
fn contains_term(text: &str, term: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = text[start..].find(term) {
        let at = start + pos;
        let boundary = at == 0
            || !text[..at]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        if boundary {
            return true;
        }
        start = at + 1;
        if start >= text.len() {
            break;
        }
    }
    false
}

/// Rewrite a standalone "cs" token to "acs" when the surrounding words
/// say cardiac, and only then. Never touches "cs" inside another word.
fn disambiguate_cs(text: &str) -> String {
    let has_cs_token = text
        .split_whitespace()
        .any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == "cs");
    let has_acs_token = text
        .split_whitespace()
        .any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == "acs");
    if !has_cs_token || has_acs_token {
        return text.to_string();
    }
    if !ACS_INDICATORS.iter().any(|ind| contains_term(text, ind)) {
        return text.to_string();
    }

    text.split_whitespace()
        .map(|word| {
            let core = word.trim_matches(|c: char| !c.is_alphanumeric());
            if core == "cs" {
                word.replacen("cs", "acs", 1)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One scan over the text, first matching correction wins per site.
/// A site only qualifies when the match starts and ends at word edges.
fn apply_corrections(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        let at_word_start = !text[..i]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
        let matched = if at_word_start {
            CORRECTIONS.iter().find(|(p, _)| {
                rest.starts_with(p)
                    && !rest[p.len()..]
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_alphanumeric())
            })
        } else {
            None
        };
        if let Some((pattern, replacement)) = matched {
            out.push_str(replacement);
            i += pattern.len();
        } else if let Some(c) = rest.chars().next() {
            out.push(c);
            i += c.len_utf8();
        } else {
            break;
        }
    }
    out
}

/// Canonicalize a raw transcript for extraction and dispatch.
pub fn normalize(raw: &str) -> String {
    let text = raw.to_lowercase();
    let text = disambiguate_cs(&text);
    let text = apply_corrections(&text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append retrieval-only context and synonym terms to a normalized query.
///
/// Each trigger fires at most once. Synonym checks run against the
/// growing string, so "bleeding" pulling in "hemorrhage" also pulls the
/// hemorrhage synonyms. The original query stays as the prefix.
pub fn expand(normalized: &str) -> String {
    let mut expanded = normalized.to_string();
    for (trigger, terms) in CONTEXT_EXPANSIONS {
        if contains_term(normalized, trigger) {
            expanded.push(' ');
            expanded.push_str(terms);
        }
    }
    for (trigger, terms) in SYNONYM_EXPANSIONS {
        if contains_term(&expanded, trigger) {
            expanded.push(' ');
            expanded.push_str(terms);
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specific_fix_beats_generic() {
        assert_eq!(normalize("packing the womb"), "uterine packing");
        assert_eq!(normalize("start packing now"), "start wound packing now");
    }

    #[test]
    fn test_unit_words_canonicalized() {
        assert_eq!(normalize("Patient is 80 kilograms"), "patient is 80 kg");
        assert_eq!(normalize("give 50 micrograms"), "give 50 mcg");
    }

    #[test]
    fn test_vital_names_canonicalized() {
        assert_eq!(normalize("heart rate 40"), "hr 40");
        assert_eq!(normalize("oxygen saturation 92"), "spo2 92");
        assert_eq!(normalize("Blood pressure 120/80"), "bp 120/80");
    }

    #[test]
    fn test_phrasing_repairs() {
        assert_eq!(normalize("should I give TXA"), "administer txa");
        assert_eq!(normalize("what about   morphine"), "morphine");
    }

    #[test]
    fn test_cs_rewritten_only_with_indicator() {
        assert_eq!(
            normalize("patient having cs symptoms"),
            "patient having acs symptoms"
        );
        // No cardiac indicator, no rewrite.
        assert_eq!(normalize("check the cs level"), "check the cs level");
    }

    #[test]
    fn test_cs_inside_words_untouched() {
        assert_eq!(normalize("narcotics for pain"), "narcotics for pain");
    }

    #[test]
    fn test_corrections_respect_word_edges() {
        // "the tourniquet" contains the "he to" repair as a substring.
        assert_eq!(normalize("apply the tourniquet"), "apply the tourniquet");
        assert_eq!(normalize("he took the kit"), "he took the kit");
    }

    #[test]
    fn test_cs_left_alone_when_acs_present() {
        assert_eq!(
            normalize("acs or cs chest pain"),
            "acs or cs chest pain"
        );
    }

    #[test]
    fn test_expand_appends_context_terms() {
        let out = expand("bleeding from the leg");
        assert!(out.starts_with("bleeding from the leg"));
        assert!(out.contains("hemorrhage"));
        assert!(out.contains("blood loss"));
    }

    #[test]
    fn test_expand_cascades_through_introduced_terms() {
        // "bleeding" introduces "hemorrhage", whose own synonyms then fire.
        let out = expand("bleeding");
        assert!(out.contains("bleeding control"));
    }

    #[test]
    fn test_expand_trigger_fires_once() {
        let out = expand("burn burn burn");
        assert_eq!(out.matches("burn management thermal").count(), 1);
    }

    #[test]
    fn test_mi_trigger_needs_word_boundary() {
        assert!(expand("mi protocol").contains("myocardial infarction"));
        assert!(!expand("administer txa now").contains("myocardial"));
    }

    #[test]
    fn test_prefix_trigger_matches_inflected_words() {
        // "burned" still cues the burn context for retrieval.
        assert!(expand("soldier burned by fuel").contains("thermal"));
    }

    #[test]
    fn test_expand_leaves_dispatch_text_untouched() {
        let normalized = normalize("ketamine for pain");
        assert_eq!(normalized, "ketamine for pain");
        let expanded = expand(&normalized);
        assert!(expanded.starts_with("ketamine for pain"));
        assert!(expanded.contains("analgesia"));
    }
}
