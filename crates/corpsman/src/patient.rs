//! Per-session patient context.
//!
//! Every normalized utterance is mined for weight, allergies, conditions
//! and vitals before dispatch. Whatever is found accumulates on the
//! session and feeds dose math, safety gates and contraindication checks
//! on later turns. Extraction patterns are written against normalized
//! vocabulary ("bp", "hr", "kg"), not raw speech.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const LB_TO_KG: f64 = 0.453592;

/// Allergens worth tracking in the field.
const ALLERGY_TERMS: &[&str] = &["penicillin", "sulfa", "aspirin", "latex", "peanuts", "shellfish"];

/// Tracked vital signs. Keys for the context map and the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalSign {
    Hr,
    BpSystolic,
    BpDiastolic,
    Rr,
    Spo2,
    Temp,
}

impl VitalSign {
    /// Spoken label, used in concern strings.
    pub fn label(&self) -> &'static str {
        match self {
            VitalSign::Hr => "HR",
            VitalSign::BpSystolic => "systolic BP",
            VitalSign::BpDiastolic => "diastolic BP",
            VitalSign::Rr => "RR",
            VitalSign::Spo2 => "SpO2",
            VitalSign::Temp => "temperature",
        }
    }
}

impl fmt::Display for VitalSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Chronic or presenting conditions that change treatment choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Pregnancy,
    Diabetes,
    Hypertension,
    Asthma,
    HeartDisease,
    Burn,
    Trauma,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Pregnancy => "pregnancy",
            Condition::Diabetes => "diabetes",
            Condition::Hypertension => "hypertension",
            Condition::Asthma => "asthma",
            Condition::HeartDisease => "heart disease",
            Condition::Burn => "burn",
            Condition::Trauma => "trauma",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One timestamped vital measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalRecord {
    pub taken_at: DateTime<Utc>,
    pub vital: VitalSign,
    pub value: f64,
}

/// What one utterance changed. Drives the acknowledgment reply on
/// turns that carry context but no answerable request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextDelta {
    pub weight: bool,
    pub allergies: Vec<String>,
    pub conditions: Vec<Condition>,
    pub vitals: Vec<VitalSign>,
}

impl ContextDelta {
    pub fn any(&self) -> bool {
        self.weight
            || !self.allergies.is_empty()
            || !self.conditions.is_empty()
            || !self.vitals.is_empty()
    }
}

/// Accumulated patient state for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientContext {
    pub weight_kg: Option<f64>,
    pub allergies: BTreeSet<String>,
    pub conditions: BTreeSet<Condition>,
    /// Latest value per vital.
    pub vitals: BTreeMap<VitalSign, f64>,
    /// Every measurement ever spoken, in arrival order.
    pub vital_history: Vec<VitalRecord>,
    /// Critical patients get a tighter vital recheck window.
    pub critical_patient: bool,
    pub last_vital_check: Option<DateTime<Utc>>,
}

static WEIGHT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d+(?:\.\d+)?)\s*(kg|kilogram|kilo|pound|lb)s?\b").unwrap()
});

static BP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d+)/(\d+)\b").unwrap());

static HR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bhr\s*(\d+)\b").unwrap());

static RR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\brr\s*(\d+)\b").unwrap());

static SPO2_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bspo2\s*(\d+)\b").unwrap());

static TEMP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\btemp\s*(\d+(?:\.\d+)?)\b").unwrap());

/// Condition keyword tables, matched on word boundaries so "vitamin"
/// never reads as an MI mention. Keywords use normalized vocabulary;
/// "high blood pressure" arrives here as "high bp".
static CONDITION_RES: Lazy<Vec<(Condition, Regex)>> = Lazy::new(|| {
    let table: &[(Condition, &[&str])] = &[
        (Condition::Pregnancy, &["pregnant", "pregnancy"]),
        (Condition::Diabetes, &["diabetic", "diabetes"]),
        (Condition::Hypertension, &["hypertension", "high bp"]),
        (Condition::Asthma, &["asthma", "asthmatic"]),
        (
            Condition::HeartDisease,
            &[
                "heart disease",
                "cardiac disease",
                "mi",
                "heart attack",
                "myocardial infarction",
                "coronary artery disease",
                "cardiovascular disease",
            ],
        ),
        (Condition::Burn, &["burn", "burned", "burns"]),
        (Condition::Trauma, &["trauma", "traumatic"]),
    ];
    table
        .iter()
        .map(|(cond, keywords)| {
            let alternation = keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            let re = Regex::new(&format!(r"\b(?:{alternation})\b")).unwrap();
            (*cond, re)
        })
        .collect()
});

impl PatientContext {
    /// Mine one normalized utterance and fold everything found into the
    /// context. Returns what changed on this turn.
    pub fn update(&mut self, text: &str) -> ContextDelta {
        let mut delta = ContextDelta::default();
        self.extract_weight(text, &mut delta);
        self.extract_allergies(text, &mut delta);
        self.extract_conditions(text, &mut delta);
        self.extract_vitals(text, &mut delta);
        delta
    }

    fn extract_weight(&mut self, text: &str, delta: &mut ContextDelta) {
        // Last mention wins so a correction ("no wait, 70 kg") sticks.
        if let Some(caps) = WEIGHT_RE.captures_iter(text).last() {
            let value: f64 = match caps[1].parse() {
                Ok(v) => v,
                Err(_) => return,
            };
            let kg = match &caps[2] {
                "pound" | "lb" => value * LB_TO_KG,
                _ => value,
            };
            self.weight_kg = Some(kg);
            delta.weight = true;
        }
    }

    fn extract_allergies(&mut self, text: &str, delta: &mut ContextDelta) {
        if !text.contains("allergic") && !text.contains("allergy") {
            return;
        }
        for term in ALLERGY_TERMS {
            if text.contains(term) && self.allergies.insert((*term).to_string()) {
                delta.allergies.push((*term).to_string());
            }
        }
    }

    fn extract_conditions(&mut self, text: &str, delta: &mut ContextDelta) {
        for (cond, re) in CONDITION_RES.iter() {
            if re.is_match(text) && self.conditions.insert(*cond) {
                delta.conditions.push(*cond);
            }
        }
    }

    fn extract_vitals(&mut self, text: &str, delta: &mut ContextDelta) {
        if let Some(caps) = BP_RE.captures_iter(text).last() {
            if let (Ok(sys), Ok(dia)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) {
                self.record_vital(VitalSign::BpSystolic, sys, delta);
                self.record_vital(VitalSign::BpDiastolic, dia, delta);
            }
        }
        let singles: &[(&Lazy<Regex>, VitalSign)] = &[
            (&HR_RE, VitalSign::Hr),
            (&RR_RE, VitalSign::Rr),
            (&SPO2_RE, VitalSign::Spo2),
            (&TEMP_RE, VitalSign::Temp),
        ];
        for (re, vital) in singles {
            if let Some(caps) = re.captures_iter(text).last() {
                if let Ok(value) = caps[1].parse::<f64>() {
                    self.record_vital(*vital, value, delta);
                }
            }
        }
    }

    fn record_vital(&mut self, vital: VitalSign, value: f64, delta: &mut ContextDelta) {
        let now = Utc::now();
        self.vitals.insert(vital, value);
        self.vital_history.push(VitalRecord {
            taken_at: now,
            vital,
            value,
        });
        self.last_vital_check = Some(now);
        delta.vitals.push(vital);
    }

    /// Spoken readback of the latest vitals.
    pub fn vital_summary(&self) -> String {
        let mut parts = Vec::new();
        if let (Some(sys), Some(dia)) = (
            self.vitals.get(&VitalSign::BpSystolic),
            self.vitals.get(&VitalSign::BpDiastolic),
        ) {
            parts.push(format!("BP: {sys:.0}/{dia:.0}"));
        }
        if let Some(hr) = self.vitals.get(&VitalSign::Hr) {
            parts.push(format!("HR: {hr:.0}"));
        }
        if let Some(spo2) = self.vitals.get(&VitalSign::Spo2) {
            parts.push(format!("SpO2: {spo2:.0}%"));
        }
        if let Some(rr) = self.vitals.get(&VitalSign::Rr) {
            parts.push(format!("RR: {rr:.0}"));
        }
        if let Some(temp) = self.vitals.get(&VitalSign::Temp) {
            parts.push(format!("Temp: {temp:.1}°C"));
        }
        if parts.is_empty() {
            "No vitals recorded.".to_string()
        } else {
            parts.join(", ")
        }
    }

    /// Reply for a turn that carried context but no answerable request.
    /// One change category is acknowledged, weight first since it gates
    /// dose math.
    pub fn acknowledge(&self, delta: &ContextDelta) -> String {
        const PROMPT: &str = "What medical assistance do you need?";
        if delta.weight {
            if let Some(kg) = self.weight_kg {
                return format!("Patient context updated. Weight: {kg:.1} kg. {PROMPT}");
            }
        }
        if !delta.allergies.is_empty() {
            return format!("Allergies noted: {}. {PROMPT}", delta.allergies.join(", "));
        }
        if !delta.conditions.is_empty() {
            let names: Vec<&str> = delta.conditions.iter().map(|c| c.label()).collect();
            return format!("Conditions noted: {}. {PROMPT}", names.join(", "));
        }
        if !delta.vitals.is_empty() {
            return format!("Vitals recorded: {}. {PROMPT}", self.vital_summary());
        }
        format!("Context updated. {PROMPT}")
    }
}
