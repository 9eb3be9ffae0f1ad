//! Query resolution.
//!
//! One normalized utterance goes in, one [`Decision`] comes out. The
//! dispatch order is deliberate and safety-first: stale vitals outrank
//! everything, the vital gate outranks treatment rules, direct rules
//! outrank decision trees, and corpus retrieval is the fallback when no
//! rule owns the query. Context-bearing turns that reach the bottom
//! without a confident answer are acknowledged instead of guessed at.

use serde::Serialize;
use std::fmt;

use corpsman_core::{expand, CorpusStore, LexicalIndex};

use crate::contra;
use crate::patient::{Condition, ContextDelta, PatientContext};
use crate::policy::ClinicalPolicy;
use crate::respond;
use crate::vitals::{self, VitalCurrency, VitalGate};

/// Words that flag a readback request for the recorded vitals.
const VITAL_SUMMARY_TERMS: &[&str] = &["vital signs", "current vitals", "patient status", "vitals"];

/// Assessment wording makes decision trees win over treatment rules.
const ASSESSMENT_WORDS: &[&str] = &["assess", "evaluate", "examine"];

/// Broad intent of a query, kept on the decision for logging and
/// after-action review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    Assessment,
    Intervention,
    Monitoring,
    Emergency,
    Medication,
    General,
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecisionType::Assessment => "assessment",
            DecisionType::Intervention => "intervention",
            DecisionType::Monitoring => "monitoring",
            DecisionType::Emergency => "emergency",
            DecisionType::Medication => "medication",
            DecisionType::General => "general",
        };
        f.write_str(s)
    }
}

/// First matching pattern set wins, in this order.
const DECISION_PATTERNS: &[(DecisionType, &[&str])] = &[
    (
        DecisionType::Assessment,
        &["assess", "evaluate", "examine", "check", "look for"],
    ),
    (
        DecisionType::Intervention,
        &["treat", "intervene", "manage", "administer", "apply"],
    ),
    (
        DecisionType::Monitoring,
        &["monitor", "observe", "watch", "track", "follow"],
    ),
    (
        DecisionType::Emergency,
        &["emergency", "urgent", "immediate", "critical", "stat"],
    ),
    (
        DecisionType::Medication,
        &["medication", "drug", "dose", "administer", "give"],
    ),
];

pub fn classify_decision_type(query: &str) -> DecisionType {
    for (decision_type, words) in DECISION_PATTERNS {
        if words.iter().any(|w| query.contains(w)) {
            return *decision_type;
        }
    }
    DecisionType::General
}

/// Which dispatch step produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveRoute {
    /// Vitals on file are too old. Answer is the recheck demand.
    Staleness,
    /// Vital gate stopped or cautioned the treatment.
    VitalGate,
    /// Direct medication dosing rule.
    MedicationRule,
    /// Direct procedure rule.
    ProcedureRule,
    /// Scenario decision tree.
    DecisionTree,
    /// Patient flagged critical this turn.
    CriticalDesignation,
    /// Readback of recorded vitals.
    VitalSummary,
    /// Context noted, nothing to answer.
    ContextAck,
    /// Corpus retrieval fallback.
    Retrieval,
    /// No answer, asked for clarification.
    Clarification,
}

impl ResolveRoute {
    /// Routes whose answers deserve a vitals reminder when none were
    /// ever recorded.
    fn is_clinical_answer(&self) -> bool {
        matches!(
            self,
            ResolveRoute::MedicationRule
                | ResolveRoute::ProcedureRule
                | ResolveRoute::DecisionTree
                | ResolveRoute::Retrieval
        )
    }
}

impl fmt::Display for ResolveRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolveRoute::Staleness => "staleness",
            ResolveRoute::VitalGate => "vital-gate",
            ResolveRoute::MedicationRule => "medication-rule",
            ResolveRoute::ProcedureRule => "procedure-rule",
            ResolveRoute::DecisionTree => "decision-tree",
            ResolveRoute::CriticalDesignation => "critical-designation",
            ResolveRoute::VitalSummary => "vital-summary",
            ResolveRoute::ContextAck => "context-ack",
            ResolveRoute::Retrieval => "retrieval",
            ResolveRoute::Clarification => "clarification",
        };
        f.write_str(s)
    }
}

/// Urgency of a procedural recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Critical,
    Urgent,
    Standard,
}

impl Priority {
    pub fn actionable(&self) -> bool {
        matches!(self, Priority::Critical | Priority::Urgent)
    }
}

/// One recommendation inside a decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    /// Dosing answer for a named medication. Never truncated.
    Medication { name: String, text: String },
    /// Procedural steps with an urgency grade.
    Procedure {
        text: String,
        priority: Priority,
        priority_score: u8,
    },
    /// Plain spoken text: warnings, summaries, acknowledgments,
    /// retrieved guidance.
    Note { text: String },
}

/// Patient facts that shaped the decision, frozen at resolve time.
#[derive(Debug, Clone)]
pub struct PatientSnapshot {
    pub weight_kg: Option<f64>,
    pub conditions: Vec<Condition>,
    pub critical: bool,
}

impl PatientSnapshot {
    fn of(context: &PatientContext) -> Self {
        Self {
            weight_kg: context.weight_kg,
            conditions: context.conditions.iter().copied().collect(),
            critical: context.critical_patient,
        }
    }
}

/// Resolved answer for one turn.
#[derive(Debug, Clone)]
pub struct Decision {
    pub decision_type: DecisionType,
    pub route: ResolveRoute,
    pub patient: PatientSnapshot,
    pub recommendations: Vec<Recommendation>,
    /// Contraindication warnings, spoken after the answer.
    pub warnings: Option<String>,
    /// True when no vitals were ever recorded and the answer is
    /// clinical, so the reply ends with a vitals reminder.
    pub needs_vitals: bool,
    /// False when the engine had to ask instead of answer.
    pub confidence: bool,
}

/// Resolve one normalized utterance against the session context.
/// `delta` is what [`PatientContext::update`] extracted from this same
/// utterance before dispatch.
pub fn resolve(
    context: &mut PatientContext,
    delta: &ContextDelta,
    query: &str,
    corpus: &CorpusStore,
    index: &LexicalIndex,
    policy: &ClinicalPolicy,
    top_n: usize,
) -> Decision {
    let decision_type = classify_decision_type(query);
    let never_recorded = matches!(
        vitals::vital_currency(context, policy),
        VitalCurrency::NeverRecorded
    );
    let (route, recommendations, confidence) =
        dispatch(context, delta, query, corpus, index, policy, top_n);
    Decision {
        decision_type,
        route,
        patient: PatientSnapshot::of(context),
        recommendations,
        warnings: contra::check(context, query),
        needs_vitals: never_recorded && route.is_clinical_answer(),
        confidence,
    }
}

fn note(text: String) -> Vec<Recommendation> {
    vec![Recommendation::Note { text }]
}

fn dispatch(
    context: &mut PatientContext,
    delta: &ContextDelta,
    query: &str,
    corpus: &CorpusStore,
    index: &LexicalIndex,
    policy: &ClinicalPolicy,
    top_n: usize,
) -> (ResolveRoute, Vec<Recommendation>, bool) {
    // Stale vitals block everything until rechecked.
    if let VitalCurrency::Stale(msg) = vitals::vital_currency(context, policy) {
        return (ResolveRoute::Staleness, note(msg), true);
    }

    match vitals::treatment_gate(&context.vitals, query, policy) {
        VitalGate::Critical(msg) | VitalGate::Caution(msg) => {
            return (ResolveRoute::VitalGate, note(msg), true);
        }
        VitalGate::Proceed => {}
    }

    if let Some(rec) = medication_rule(query, context, policy) {
        return (ResolveRoute::MedicationRule, vec![rec], true);
    }

    // Airway always belongs to the trees, and assessment wording
    // prefers them over the treatment rules.
    let tree_first = query.contains("airway") || has_assessment_intent(query);
    if tree_first {
        if let Some(rec) = decision_tree(query) {
            return (ResolveRoute::DecisionTree, vec![rec], true);
        }
    }

    if let Some(rec) = procedure_rule(query) {
        return (ResolveRoute::ProcedureRule, vec![rec], true);
    }

    if !tree_first {
        if let Some(rec) = decision_tree(query) {
            return (ResolveRoute::DecisionTree, vec![rec], true);
        }
    }

    if query.contains("critical") || query.contains("unstable") {
        context.critical_patient = true;
        let text = format!(
            "Patient marked as critical. Vitals will be checked every {:.0} minutes.",
            policy.recheck.critical_minutes
        );
        return (ResolveRoute::CriticalDesignation, note(text), true);
    }

    if VITAL_SUMMARY_TERMS.iter().any(|t| query.contains(t)) {
        return (
            ResolveRoute::VitalSummary,
            note(context.vital_summary()),
            true,
        );
    }

    // A turn that only carried context gets acknowledged, not sent
    // into retrieval where stray tokens would match dosing text.
    if delta.any() {
        return (ResolveRoute::ContextAck, note(context.acknowledge(delta)), true);
    }

    if let Some(text) = retrieve(query, corpus, index, top_n) {
        return (ResolveRoute::Retrieval, note(text), true);
    }

    (ResolveRoute::Clarification, note(clarification(query)), false)
}

fn has_assessment_intent(query: &str) -> bool {
    ASSESSMENT_WORDS.iter().any(|w| query.contains(w))
}

fn weight_dose(weight: f64, rate: f64) -> String {
    format!("{:.0}", weight * rate)
}

/// Direct dosing rules for the medications a medic asks about by name.
fn medication_rule(
    query: &str,
    context: &PatientContext,
    policy: &ClinicalPolicy,
) -> Option<Recommendation> {
    let weight = context.weight_kg;
    let doses = &policy.doses;

    if query.contains("ketamine") {
        let text = if query.contains("pain") {
            match weight {
                Some(w) => format!(
                    "Ketamine {} mg/kg IV. For {w:.0}kg patient: {}mg IV.",
                    doses.ketamine_pain_mg_kg,
                    weight_dose(w, doses.ketamine_pain_mg_kg)
                ),
                None => format!(
                    "Ketamine {} mg/kg IV for pain. Monitor respiratory rate.",
                    doses.ketamine_pain_mg_kg
                ),
            }
        } else if query.contains("sedation") {
            match weight {
                Some(w) => format!(
                    "Ketamine {} mg/kg IV. For {w:.0}kg patient: {}mg IV.",
                    doses.ketamine_sedation_mg_kg,
                    weight_dose(w, doses.ketamine_sedation_mg_kg)
                ),
                None => "Ketamine 1-2 mg/kg IV for sedation. Monitor respiratory rate.".to_string(),
            }
        } else {
            match weight {
                Some(w) => format!(
                    "Ketamine {} mg/kg IV for pain, 1-2 mg/kg IV for sedation. \
                     For {w:.0}kg patient: {}mg IV for pain.",
                    doses.ketamine_pain_mg_kg,
                    weight_dose(w, doses.ketamine_pain_mg_kg)
                ),
                None => format!(
                    "Ketamine {} mg/kg IV for pain, 1-2 mg/kg IV for sedation.",
                    doses.ketamine_pain_mg_kg
                ),
            }
        };
        return Some(Recommendation::Medication {
            name: "ketamine".to_string(),
            text,
        });
    }

    if query.contains("morphine") {
        let text = match weight {
            Some(w) => format!(
                "Morphine {} mg/kg IV. For {w:.0}kg patient: {}mg IV.",
                doses.morphine_mg_kg,
                weight_dose(w, doses.morphine_mg_kg)
            ),
            None => format!(
                "Morphine {} mg/kg IV. Monitor respiratory rate.",
                doses.morphine_mg_kg
            ),
        };
        return Some(Recommendation::Medication {
            name: "morphine".to_string(),
            text,
        });
    }

    if query.contains("fentanyl") {
        let text = match weight {
            Some(w) => format!(
                "Fentanyl {} mcg/kg IV. For {w:.0}kg patient: {}mcg IV.",
                doses.fentanyl_mcg_kg,
                weight_dose(w, doses.fentanyl_mcg_kg)
            ),
            None => format!(
                "Fentanyl {} mcg/kg IV. Monitor for respiratory depression.",
                doses.fentanyl_mcg_kg
            ),
        };
        return Some(Recommendation::Medication {
            name: "fentanyl".to_string(),
            text,
        });
    }

    if query.contains("txa") || query.contains("tranexamic") {
        return Some(Recommendation::Medication {
            name: "txa".to_string(),
            text: "TXA 1g IV over 10 minutes. Then 1g over 8 hours.".to_string(),
        });
    }

    if vitals::mentions_epinephrine(query) {
        let text = if query.contains("arrest") {
            "Epinephrine 1mg IV every 3-5 minutes.".to_string()
        } else if query.contains("anaphylaxis") {
            "Epinephrine 0.3-0.5mg IM every 5-15 minutes.".to_string()
        } else {
            "Epinephrine 1mg IV for cardiac arrest, 0.3-0.5mg IM for anaphylaxis.".to_string()
        };
        return Some(Recommendation::Medication {
            name: "epinephrine".to_string(),
            text,
        });
    }

    if query.contains("atropine") {
        return Some(Recommendation::Medication {
            name: "atropine".to_string(),
            text: "Atropine 1mg IV. May repeat every 3-5 minutes up to 3mg total.".to_string(),
        });
    }

    None
}

fn procedure(text: &str) -> Recommendation {
    Recommendation::Procedure {
        text: text.to_string(),
        priority: Priority::Urgent,
        priority_score: 4,
    }
}

/// Direct procedure rules. Airway is deliberately absent; airway
/// queries go through the decision trees.
fn procedure_rule(query: &str) -> Option<Recommendation> {
    if query.contains("bleeding") || query.contains("hemorrhage") {
        let text = if query.contains("arterial") {
            "Apply direct pressure and tourniquet if needed. Reassess every 10 minutes."
        } else if query.contains("severe") {
            "Apply tourniquet above wound. Reassess in 2 hours."
        } else {
            "Apply direct pressure and hemostatic dressing. Reassess every 10 minutes."
        };
        return Some(procedure(text));
    }

    if query.contains("pneumothorax") {
        let text = if query.contains("tension") {
            "Needle decompression 2nd intercostal space, mid-clavicular line."
        } else if query.contains("open") {
            "Apply occlusive dressing taped on 3 sides. Monitor respiratory status."
        } else {
            "Needle decompression 2nd intercostal space for tension pneumothorax."
        };
        return Some(procedure(text));
    }

    if query.contains("chest pain") || query.contains("acs") {
        let text = if query.contains("acs") || query.contains("acute coronary") {
            "Aspirin 325mg PO, Nitroglycerin 0.4mg SL q5min x3, 12-lead ECG immediately."
        } else {
            "Aspirin 325mg PO, Nitroglycerin 0.4mg SL q5min x3, 12-lead ECG."
        };
        return Some(procedure(text));
    }

    if query.contains("fracture") {
        let text = if query.contains("pelvis") || query.contains("pelvic") {
            "Apply pelvic binder if unstable. Control hemorrhage. Monitor for shock."
        } else {
            "Immobilize fracture. Assess neurovascular status. Apply splint."
        };
        return Some(procedure(text));
    }

    if query.contains("burn") {
        let text = if query.contains("chemical") {
            "Flush with copious water. Remove contaminated clothing. Monitor airway."
        } else {
            "Cool with room temperature water. Cover with sterile dressing. Monitor airway."
        };
        return Some(procedure(text));
    }

    None
}

/// Scenario trees for the situations where the next step depends on
/// what the medic is looking at, not on a single drug or procedure.
fn decision_tree(query: &str) -> Option<Recommendation> {
    if query.contains("airway") {
        if query.contains("obstruction") || query.contains("compromise") {
            return Some(Recommendation::Procedure {
                text: "Assess airway patency. If obstructed, attempt basic adjuncts (NPA/OPA). \
                       If unsuccessful, prepare for RSI with ketamine."
                    .to_string(),
                priority: Priority::Critical,
                priority_score: 5,
            });
        }
        if query.contains("intubat") {
            return Some(Recommendation::Procedure {
                text: "Prepare for RSI: ketamine 1-2mg/kg IV, apply apneic oxygenation, \
                       have backup airway ready."
                    .to_string(),
                priority: Priority::Critical,
                priority_score: 5,
            });
        }
        return Some(Recommendation::Procedure {
            text: "Assess airway: look, listen, feel. Check for obstruction, stridor, \
                   or inability to speak."
                .to_string(),
            priority: Priority::Urgent,
            priority_score: 4,
        });
    }

    if query.contains("hemorrhage") || query.contains("shock") {
        return Some(Recommendation::Procedure {
            text: "Control bleeding with direct pressure. Start IV access. \
                   Consider tourniquet for extremity bleeding."
                .to_string(),
            priority: Priority::Critical,
            priority_score: 5,
        });
    }

    if query.contains("burn") {
        return Some(Recommendation::Procedure {
            text: "Cool burn with room temperature water. Remove jewelry. \
                   Assess airway for inhalation injury."
                .to_string(),
            priority: Priority::Urgent,
            priority_score: 4,
        });
    }

    None
}

/// Corpus retrieval: expand the query, rank lexically, rerank by
/// treatment density, then pull a speakable answer out of the best
/// guideline. Keyword scoring backstops the lexical index when it
/// comes back empty.
fn retrieve(
    query: &str,
    corpus: &CorpusStore,
    index: &LexicalIndex,
    top_n: usize,
) -> Option<String> {
    let expanded = expand(query);
    let hits: Vec<usize> = index
        .search(&expanded, top_n)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    let ranked = if hits.is_empty() {
        corpsman_core::rerank::keyword_fallback(corpus, &expanded, top_n)
    } else {
        corpsman_core::rerank::rank_by_density(corpus, &hits)
    };
    let best = *ranked.first()?;
    let entry = corpus.get(best)?;
    Some(respond::answer_from_guideline(&entry.text))
}

fn clarification(query: &str) -> String {
    if query.contains("airway") {
        "I need more context. What would you like help with? Airway assessment, \
         intubation, ventilation, or airway adjuncts?"
            .to_string()
    } else if query.contains("circulation") || query.contains("shock") {
        "I need more context. What would you like help with? Hemorrhage control, \
         resuscitation, blood products, or circulation assessment?"
            .to_string()
    } else if query.contains("trauma") {
        "I need more context. What would you like help with? Trauma assessment, \
         specific injury management, or trauma resuscitation?"
            .to_string()
    } else {
        "I couldn't find specific guidelines for that query. Please try rephrasing \
         or ask about a different aspect of trauma care."
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpsman_core::CorpusEntry;

    fn empty_corpus() -> (CorpusStore, LexicalIndex) {
        let corpus = CorpusStore::from_entries(vec![CorpusEntry {
            text: "Intraosseous vascular access placement.".to_string(),
            source: "io_access.pdf".to_string(),
            section: String::new(),
            category: String::new(),
            page: 1,
            priority_score: 1.0,
        }]);
        let index = LexicalIndex::build(&corpus);
        (corpus, index)
    }

    fn resolve_query(ctx: &mut PatientContext, query: &str) -> Decision {
        let (corpus, index) = empty_corpus();
        let policy = ClinicalPolicy::default();
        let delta = ctx.update(query);
        resolve(ctx, &delta, query, &corpus, &index, &policy, 5)
    }

    fn first_text(decision: &Decision) -> &str {
        match &decision.recommendations[0] {
            Recommendation::Medication { text, .. } => text,
            Recommendation::Procedure { text, .. } => text,
            Recommendation::Note { text } => text,
        }
    }

    #[test]
    fn test_ketamine_pain_with_weight() {
        let mut ctx = PatientContext::default();
        ctx.weight_kg = Some(80.0);
        let d = resolve_query(&mut ctx, "ketamine for pain");
        assert_eq!(d.route, ResolveRoute::MedicationRule);
        assert_eq!(
            first_text(&d),
            "Ketamine 0.3 mg/kg IV. For 80kg patient: 24mg IV."
        );
    }

    #[test]
    fn test_ketamine_without_weight_gives_rate_only() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "ketamine for pain");
        assert_eq!(
            first_text(&d),
            "Ketamine 0.3 mg/kg IV for pain. Monitor respiratory rate."
        );
    }

    #[test]
    fn test_ketamine_unspecified_lists_both_uses() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "ketamine dose");
        assert_eq!(
            first_text(&d),
            "Ketamine 0.3 mg/kg IV for pain, 1-2 mg/kg IV for sedation."
        );
    }

    #[test]
    fn test_morphine_dose_math() {
        let mut ctx = PatientContext::default();
        ctx.weight_kg = Some(70.0);
        let d = resolve_query(&mut ctx, "morphine for pain");
        assert_eq!(
            first_text(&d),
            "Morphine 0.1 mg/kg IV. For 70kg patient: 7mg IV."
        );
    }

    #[test]
    fn test_fentanyl_units_are_mcg() {
        let mut ctx = PatientContext::default();
        ctx.weight_kg = Some(70.0);
        let d = resolve_query(&mut ctx, "fentanyl dose");
        assert_eq!(
            first_text(&d),
            "Fentanyl 1 mcg/kg IV. For 70kg patient: 70mcg IV."
        );
    }

    #[test]
    fn test_txa_fixed_protocol() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "when do i give txa");
        assert_eq!(first_text(&d), "TXA 1g IV over 10 minutes. Then 1g over 8 hours.");
    }

    #[test]
    fn test_epinephrine_arrest_branch() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "epi for cardiac arrest");
        assert_eq!(first_text(&d), "Epinephrine 1mg IV every 3-5 minutes.");
    }

    #[test]
    fn test_tension_pneumothorax_rule() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "tension pneumothorax treatment");
        assert_eq!(d.route, ResolveRoute::ProcedureRule);
        assert_eq!(
            first_text(&d),
            "Needle decompression 2nd intercostal space, mid-clavicular line."
        );
    }

    #[test]
    fn test_airway_obstruction_goes_to_tree() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "airway obstruction");
        assert_eq!(d.route, ResolveRoute::DecisionTree);
        match &d.recommendations[0] {
            Recommendation::Procedure {
                text,
                priority,
                priority_score,
            } => {
                assert!(text.contains("RSI with ketamine"));
                assert_eq!(*priority, Priority::Critical);
                assert_eq!(*priority_score, 5);
            }
            other => panic!("expected procedure, got {other:?}"),
        }
    }

    #[test]
    fn test_assessment_wording_prefers_tree_over_rule() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "assess the burn");
        assert_eq!(d.route, ResolveRoute::DecisionTree);
        assert!(first_text(&d).starts_with("Cool burn with room temperature water."));
    }

    #[test]
    fn test_burn_treatment_uses_procedure_rule() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "how do i treat a burn");
        assert_eq!(d.route, ResolveRoute::ProcedureRule);
        assert!(first_text(&d).starts_with("Cool with room temperature water."));
    }

    #[test]
    fn test_shock_reaches_tree() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "patient in shock");
        assert_eq!(d.route, ResolveRoute::DecisionTree);
        assert!(first_text(&d).starts_with("Control bleeding with direct pressure."));
    }

    #[test]
    fn test_critical_designation_sets_flag() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "patient is critical");
        assert_eq!(d.route, ResolveRoute::CriticalDesignation);
        assert!(ctx.critical_patient);
        assert_eq!(
            first_text(&d),
            "Patient marked as critical. Vitals will be checked every 5 minutes."
        );
    }

    #[test]
    fn test_vital_summary_route() {
        let mut ctx = PatientContext::default();
        ctx.update("bp 120/80 hr 95");
        let d = resolve_query(&mut ctx, "what is the patient status");
        assert_eq!(d.route, ResolveRoute::VitalSummary);
        assert_eq!(first_text(&d), "BP: 120/80, HR: 95");
    }

    #[test]
    fn test_context_only_turn_acknowledges() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "patient is 80 kg");
        assert_eq!(d.route, ResolveRoute::ContextAck);
        assert_eq!(
            first_text(&d),
            "Patient context updated. Weight: 80.0 kg. What medical assistance do you need?"
        );
        assert!(d.confidence);
    }

    #[test]
    fn test_context_turn_with_request_answers_request() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "80 kg patient burned, ketamine for pain");
        assert_eq!(d.route, ResolveRoute::MedicationRule);
        assert_eq!(
            first_text(&d),
            "Ketamine 0.3 mg/kg IV. For 80kg patient: 24mg IV."
        );
        assert!(ctx.conditions.contains(&Condition::Burn));
    }

    #[test]
    fn test_unknown_query_clarifies() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "what about the thing");
        assert_eq!(d.route, ResolveRoute::Clarification);
        assert!(!d.confidence);
        assert!(first_text(&d).starts_with("I couldn't find specific guidelines"));
    }

    #[test]
    fn test_trauma_clarification_is_specific() {
        let mut ctx = PatientContext::default();
        // Condition was recorded on an earlier turn, so this bare
        // repeat carries no new context and falls to clarification.
        ctx.update("trauma");
        let d = resolve_query(&mut ctx, "trauma");
        assert_eq!(d.route, ResolveRoute::Clarification);
        assert!(first_text(&d).contains("Trauma assessment"));
    }

    #[test]
    fn test_stale_vitals_block_answers() {
        use chrono::{Duration, Utc};
        let mut ctx = PatientContext::default();
        ctx.update("hr 80");
        ctx.last_vital_check = Some(Utc::now() - Duration::minutes(20));
        let d = resolve_query(&mut ctx, "ketamine for pain");
        assert_eq!(d.route, ResolveRoute::Staleness);
        assert!(first_text(&d).starts_with("Vitals may be outdated."));
    }

    #[test]
    fn test_critical_vitals_block_treatment() {
        let mut ctx = PatientContext::default();
        ctx.update("hr 40");
        let d = resolve_query(&mut ctx, "ketamine for pain");
        assert_eq!(d.route, ResolveRoute::VitalGate);
        assert!(first_text(&d).starts_with("CRITICAL: HR 40 critically low."));
        assert!(first_text(&d).contains("atropine"));
    }

    #[test]
    fn test_warnings_attached_for_pregnancy() {
        let mut ctx = PatientContext::default();
        ctx.update("patient is pregnant");
        let d = resolve_query(&mut ctx, "ketamine for pain");
        assert_eq!(
            d.warnings.as_deref(),
            Some("Pregnancy may affect drug metabolism")
        );
    }

    #[test]
    fn test_needs_vitals_only_on_clinical_answers() {
        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "ketamine for pain");
        assert!(d.needs_vitals);

        let mut ctx = PatientContext::default();
        let d = resolve_query(&mut ctx, "patient is 80 kg");
        assert!(!d.needs_vitals);
    }

    #[test]
    fn test_decision_type_classification() {
        assert_eq!(
            classify_decision_type("assess the airway"),
            DecisionType::Assessment
        );
        assert_eq!(
            classify_decision_type("treat the wound"),
            DecisionType::Intervention
        );
        assert_eq!(
            classify_decision_type("give morphine"),
            DecisionType::Medication
        );
        assert_eq!(classify_decision_type("hello there"), DecisionType::General);
    }
}
