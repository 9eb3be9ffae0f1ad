//! Engine assembly and the turn loop.
//!
//! The engine owns the loaded corpus, its index and the clinical
//! policy. Sessions carry per-caller patient state. One failed turn
//! must never take the session down with it, so each turn runs behind
//! an unwind boundary and degrades to an apology.

use chrono::{DateTime, Utc};
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

use corpsman_core::{normalize, CorpusStore, LexicalIndex, RecallResult};

use crate::config::EngineConfig;
use crate::patient::PatientContext;
use crate::policy::ClinicalPolicy;
use crate::resolver;
use crate::respond;

/// Reply when a turn fails internally.
pub const APOLOGY: &str = "Sorry, there was an error processing your query. Please try again.";

/// Where finished replies go. The engine composes text and nothing
/// else; delivery belongs to the sink.
pub trait SpeechSink {
    fn speak(&mut self, text: &str) -> io::Result<()>;
}

/// Sink that prints replies to stdout, one per line.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl SpeechSink for StdoutSink {
    fn speak(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{text}")?;
        out.flush()
    }
}

/// One answered turn, kept for after-action review.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub at: DateTime<Utc>,
    pub query: String,
    pub response: String,
}

/// Per-caller state: patient context plus the turn transcript.
#[derive(Debug, Default)]
pub struct Session {
    pub context: PatientContext,
    pub transcript: Vec<TurnRecord>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The assembled query engine. Immutable after init; all mutable state
/// lives on the [`Session`].
pub struct Engine {
    corpus: CorpusStore,
    index: LexicalIndex,
    policy: ClinicalPolicy,
    top_n: usize,
}

impl Engine {
    /// Load the corpus and policy named by the config and build the
    /// index. A missing or empty corpus is fatal; a missing policy
    /// file falls back to compiled defaults.
    pub fn init(config: &EngineConfig) -> RecallResult<Self> {
        let corpus = CorpusStore::load(&config.corpus_dir, &config.artifacts)?;
        info!(
            "Loaded {} guideline entries from {}",
            corpus.len(),
            corpus.loaded_from().display()
        );
        let index = LexicalIndex::build(&corpus);
        debug!(
            "Indexed {} documents, average length {:.1} tokens",
            index.doc_count(),
            index.avg_doc_len()
        );
        let policy = ClinicalPolicy::load_or_default(config.policy_path.as_deref());
        Ok(Self {
            corpus,
            index,
            policy,
            top_n: config.retrieval_top_n,
        })
    }

    /// Assemble an engine from parts already in memory.
    pub fn from_parts(corpus: CorpusStore, policy: ClinicalPolicy, top_n: usize) -> Self {
        let index = LexicalIndex::build(&corpus);
        Self {
            corpus,
            index,
            policy,
            top_n,
        }
    }

    pub fn policy(&self) -> &ClinicalPolicy {
        &self.policy
    }

    /// Answer one utterance. A failure inside the turn yields the
    /// apology and leaves the session usable for the next turn.
    pub fn process_turn(&self, session: &mut Session, raw: &str) -> String {
        match panic::catch_unwind(AssertUnwindSafe(|| self.answer(session, raw))) {
            Ok(response) => response,
            Err(_) => {
                warn!("Turn failed for query {raw:?}, replying with apology");
                APOLOGY.to_string()
            }
        }
    }

    fn answer(&self, session: &mut Session, raw: &str) -> String {
        let query = normalize(raw);
        let delta = session.context.update(&query);
        let decision = resolver::resolve(
            &mut session.context,
            &delta,
            &query,
            &self.corpus,
            &self.index,
            &self.policy,
            self.top_n,
        );
        debug!(
            "Resolved {:?} via {} as {}",
            raw, decision.route, decision.decision_type
        );
        let response = respond::compose(&decision);
        session.transcript.push(TurnRecord {
            at: Utc::now(),
            query: raw.to_string(),
            response: response.clone(),
        });
        response
    }
}
