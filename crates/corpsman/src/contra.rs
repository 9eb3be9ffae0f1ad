//! Condition-drug contraindication checks.

use crate::patient::{Condition, PatientContext};

/// Each rule: the recorded condition, the drug terms that trip it, and
/// the warning spoken when both are present.
const RULES: &[(Condition, &[&str], &str)] = &[
    (
        Condition::Pregnancy,
        &["ketamine", "morphine", "fentanyl"],
        "Pregnancy may affect drug metabolism",
    ),
    (
        Condition::Hypertension,
        &["epinephrine"],
        "Epinephrine may exacerbate hypertension",
    ),
    (
        Condition::Asthma,
        &["aspirin", "nsaid"],
        "NSAIDs may trigger asthma exacerbation",
    ),
];

/// Warnings for drugs named in the query against the recorded
/// conditions, joined with "; ". None when nothing applies.
pub fn check(context: &PatientContext, query: &str) -> Option<String> {
    let mut warnings = Vec::new();
    for (condition, drugs, warning) in RULES {
        if !context.conditions.contains(condition) {
            continue;
        }
        if drugs.iter().any(|d| query.contains(d)) {
            warnings.push(*warning);
        }
    }
    if warnings.is_empty() {
        None
    } else {
        Some(warnings.join("; "))
    }
}
