//! Decision layer for the corpsman engine.
//!
//! Sits on top of [`corpsman_core`]: tracks patient context across a
//! session, gates treatments against vitals, answers medication and
//! procedure queries from direct rules and decision trees, and falls
//! back to corpus retrieval when no rule owns the query.

pub mod config;
pub mod contra;
pub mod engine;
pub mod patient;
pub mod policy;
pub mod resolver;
pub mod respond;
pub mod vitals;

pub use config::EngineConfig;
pub use engine::{Engine, Session, SpeechSink, StdoutSink};
pub use patient::{Condition, PatientContext, VitalSign};
pub use policy::ClinicalPolicy;
pub use resolver::{Decision, DecisionType, Recommendation, ResolveRoute};
