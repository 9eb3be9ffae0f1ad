//! Clinical policy tables.
//!
//! Dose rates, vital-sign ranges and recheck windows are data, not code.
//! Defaults are compiled in; a TOML file can override any subset. The
//! numbers here are provisional working values pending clinical review,
//! which is exactly why they live in a table a reviewer can edit.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::patient::VitalSign;

/// Default policy file path.
pub const POLICY_PATH: &str = "/etc/corpsman/policy.toml";

/// Normal and critical band for one vital sign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VitalRange {
    pub min: f64,
    pub max: f64,
    pub critical_low: f64,
    pub critical_high: f64,
}

/// Ranges for every tracked vital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalRanges {
    #[serde(default = "default_hr")]
    pub hr: VitalRange,

    #[serde(default = "default_bp_systolic")]
    pub bp_systolic: VitalRange,

    #[serde(default = "default_bp_diastolic")]
    pub bp_diastolic: VitalRange,

    #[serde(default = "default_rr")]
    pub rr: VitalRange,

    #[serde(default = "default_spo2")]
    pub spo2: VitalRange,

    #[serde(default = "default_temp")]
    pub temp: VitalRange,
}

fn default_hr() -> VitalRange {
    VitalRange {
        min: 60.0,
        max: 100.0,
        critical_low: 50.0,
        critical_high: 120.0,
    }
}

fn default_bp_systolic() -> VitalRange {
    VitalRange {
        min: 90.0,
        max: 140.0,
        critical_low: 80.0,
        critical_high: 180.0,
    }
}

fn default_bp_diastolic() -> VitalRange {
    VitalRange {
        min: 60.0,
        max: 90.0,
        critical_low: 50.0,
        critical_high: 110.0,
    }
}

fn default_rr() -> VitalRange {
    VitalRange {
        min: 12.0,
        max: 20.0,
        critical_low: 8.0,
        critical_high: 30.0,
    }
}

fn default_spo2() -> VitalRange {
    VitalRange {
        min: 95.0,
        max: 100.0,
        critical_low: 90.0,
        critical_high: 100.0,
    }
}

fn default_temp() -> VitalRange {
    VitalRange {
        min: 36.5,
        max: 37.5,
        critical_low: 35.0,
        critical_high: 39.0,
    }
}

impl Default for VitalRanges {
    fn default() -> Self {
        Self {
            hr: default_hr(),
            bp_systolic: default_bp_systolic(),
            bp_diastolic: default_bp_diastolic(),
            rr: default_rr(),
            spo2: default_spo2(),
            temp: default_temp(),
        }
    }
}

impl VitalRanges {
    pub fn range(&self, vital: VitalSign) -> VitalRange {
        match vital {
            VitalSign::Hr => self.hr,
            VitalSign::BpSystolic => self.bp_systolic,
            VitalSign::BpDiastolic => self.bp_diastolic,
            VitalSign::Rr => self.rr,
            VitalSign::Spo2 => self.spo2,
            VitalSign::Temp => self.temp,
        }
    }
}

/// Weight-based dose rates for the directly answerable medications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseRates {
    /// Ketamine analgesic rate, mg per kg.
    #[serde(default = "default_ketamine_pain")]
    pub ketamine_pain_mg_kg: f64,

    /// Ketamine sedation rate, mg per kg.
    #[serde(default = "default_ketamine_sedation")]
    pub ketamine_sedation_mg_kg: f64,

    /// Morphine rate, mg per kg.
    #[serde(default = "default_morphine")]
    pub morphine_mg_kg: f64,

    /// Fentanyl rate, mcg per kg.
    #[serde(default = "default_fentanyl")]
    pub fentanyl_mcg_kg: f64,
}

fn default_ketamine_pain() -> f64 {
    0.3
}

fn default_ketamine_sedation() -> f64 {
    1.5
}

fn default_morphine() -> f64 {
    0.1
}

fn default_fentanyl() -> f64 {
    1.0
}

impl Default for DoseRates {
    fn default() -> Self {
        Self {
            ketamine_pain_mg_kg: default_ketamine_pain(),
            ketamine_sedation_mg_kg: default_ketamine_sedation(),
            morphine_mg_kg: default_morphine(),
            fentanyl_mcg_kg: default_fentanyl(),
        }
    }
}

/// How long recorded vitals stay trustworthy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecheckWindows {
    /// Critical patients need vitals at least this often, in minutes.
    #[serde(default = "default_critical_minutes")]
    pub critical_minutes: f64,

    /// Routine patients need vitals at least this often, in minutes.
    #[serde(default = "default_routine_minutes")]
    pub routine_minutes: f64,
}

fn default_critical_minutes() -> f64 {
    5.0
}

fn default_routine_minutes() -> f64 {
    15.0
}

impl Default for RecheckWindows {
    fn default() -> Self {
        Self {
            critical_minutes: default_critical_minutes(),
            routine_minutes: default_routine_minutes(),
        }
    }
}

/// Full clinical policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicalPolicy {
    #[serde(default)]
    pub vitals: VitalRanges,

    #[serde(default)]
    pub doses: DoseRates,

    #[serde(default)]
    pub recheck: RecheckWindows,
}

impl ClinicalPolicy {
    /// Load policy from `path`, falling back to compiled defaults on any
    /// failure. An unreadable policy file must not stop the engine; the
    /// defaults are the same values the file would normally carry.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p,
            None => Path::new(POLICY_PATH),
        };
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(policy) => {
                    info!("Loaded clinical policy from {}", path.display());
                    policy
                }
                Err(e) => {
                    warn!("Policy file {} is invalid, using defaults: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}
