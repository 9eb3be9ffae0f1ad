//! Vital-sign risk analysis.
//!
//! Two consumers: the treatment gate, which decides whether a requested
//! treatment may proceed against the latest vitals, and the staleness
//! check, which blocks clinical answers when the vitals on file are too
//! old to trust.

use chrono::Utc;
use std::collections::BTreeMap;

use crate::patient::{PatientContext, VitalSign};
use crate::policy::ClinicalPolicy;

/// Overall read of the latest vitals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalStatus {
    Normal,
    Abnormal,
    Critical,
}

/// Analyzer output: concerns in vital order, with per-vital
/// recommendations where the protocol names one.
#[derive(Debug, Clone)]
pub struct VitalAssessment {
    pub status: VitalStatus,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Whether a requested treatment may proceed.
#[derive(Debug, Clone, PartialEq)]
pub enum VitalGate {
    /// Vitals are critical. Stabilize before any treatment.
    Critical(String),
    /// The requested drug interacts badly with the current vitals.
    Caution(String),
    Proceed,
}

/// How trustworthy the vitals on file are.
#[derive(Debug, Clone, PartialEq)]
pub enum VitalCurrency {
    /// No vitals this session. Answers get a reminder appended.
    NeverRecorded,
    /// Too old for the patient's acuity. Blocks clinical answers.
    Stale(String),
    Fresh,
}

fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

/// Score the latest vitals against the policy bands.
pub fn analyze(vitals: &BTreeMap<VitalSign, f64>, policy: &ClinicalPolicy) -> VitalAssessment {
    let mut concerns = Vec::new();
    let mut recommendations = Vec::new();
    let mut critical = false;

    for (&vital, &value) in vitals {
        let range = policy.vitals.range(vital);
        if value < range.critical_low || value > range.critical_high {
            critical = true;
            let direction = if value < range.critical_low {
                "critically low"
            } else {
                "critically high"
            };
            concerns.push(format!("{} {} {direction}", vital.label(), fmt_value(value)));
            match (vital, value < range.critical_low) {
                (VitalSign::Hr, true) => {
                    recommendations.push("Consider atropine 1mg IV for bradycardia".to_string());
                }
                (VitalSign::Hr, false) => {
                    recommendations
                        .push("Monitor for shock, consider fluid resuscitation".to_string());
                }
                (VitalSign::BpSystolic, true) => {
                    recommendations
                        .push("Consider fluid resuscitation, monitor for shock".to_string());
                }
                (VitalSign::Spo2, true) => {
                    recommendations
                        .push("Administer oxygen, consider airway intervention".to_string());
                }
                _ => {}
            }
        } else if value < range.min || value > range.max {
            concerns.push(format!(
                "{} {} outside normal range",
                vital.label(),
                fmt_value(value)
            ));
        }
    }

    let status = if critical {
        VitalStatus::Critical
    } else if concerns.is_empty() {
        VitalStatus::Normal
    } else {
        VitalStatus::Abnormal
    };
    VitalAssessment {
        status,
        concerns,
        recommendations,
    }
}

/// True when the query names epinephrine, including the spoken
/// short form "epi" as a standalone word.
pub fn mentions_epinephrine(query: &str) -> bool {
    query.contains("epinephrine")
        || query
            .split_whitespace()
            .any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == "epi")
}

/// Gate a treatment request against the latest vitals. Critical vitals
/// stop everything; specific drug requests draw a caution when the
/// vitals argue against that drug.
pub fn treatment_gate(
    vitals: &BTreeMap<VitalSign, f64>,
    query: &str,
    policy: &ClinicalPolicy,
) -> VitalGate {
    if vitals.is_empty() {
        return VitalGate::Proceed;
    }

    let assessment = analyze(vitals, policy);
    if assessment.status == VitalStatus::Critical {
        let concern = assessment
            .concerns
            .first()
            .cloned()
            .unwrap_or_else(|| "vitals out of range".to_string());
        let action = assessment
            .recommendations
            .first()
            .cloned()
            .unwrap_or_else(|| "Stabilize patient first.".to_string());
        let action = action.trim_end_matches('.').to_string();
        return VitalGate::Critical(format!("CRITICAL: {concern}. {action}."));
    }

    let wants_epi = mentions_epinephrine(query);
    if wants_epi {
        if let Some(&hr) = vitals.get(&VitalSign::Hr) {
            if hr > policy.vitals.hr.max {
                return VitalGate::Caution(
                    "Tachycardia present. Consider alternative to epinephrine.".to_string(),
                );
            }
        }
        if let Some(&sys) = vitals.get(&VitalSign::BpSystolic) {
            if sys > policy.vitals.bp_systolic.max {
                return VitalGate::Caution(
                    "Severe hypertension. Consider alternative to epinephrine.".to_string(),
                );
            }
        }
    }
    if query.contains("morphine") || query.contains("fentanyl") {
        if let Some(&spo2) = vitals.get(&VitalSign::Spo2) {
            if spo2 < policy.vitals.spo2.min {
                return VitalGate::Caution(
                    "Low oxygen saturation. Monitor respiratory depression closely.".to_string(),
                );
            }
        }
    }
    VitalGate::Proceed
}

/// Classify how current the vitals on file are. Critical patients get
/// the tight window, everyone else the routine one.
pub fn vital_currency(context: &PatientContext, policy: &ClinicalPolicy) -> VitalCurrency {
    let last = match context.last_vital_check {
        Some(t) => t,
        None => return VitalCurrency::NeverRecorded,
    };
    let minutes = (Utc::now() - last).num_seconds() as f64 / 60.0;
    if context.critical_patient && minutes > policy.recheck.critical_minutes {
        return VitalCurrency::Stale(format!(
            "Critical patient - vitals needed. Last check: {minutes:.0} minutes ago."
        ));
    }
    if minutes > policy.recheck.routine_minutes {
        return VitalCurrency::Stale(format!(
            "Vitals may be outdated. Last check: {minutes:.0} minutes ago."
        ));
    }
    VitalCurrency::Fresh
}
