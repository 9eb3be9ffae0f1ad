//! Recall layer for the corpsman engine.
//!
//! Everything needed to turn a normalized query into ranked guideline
//! entries: the corpus store, the BM25 index, transcript normalization
//! and the actionability re-ranker. No clinical judgment lives here.

pub mod corpus;
pub mod error;
pub mod index;
pub mod normalize;
pub mod rerank;

pub use corpus::{CorpusEntry, CorpusStore};
pub use error::{RecallError, RecallResult};
pub use index::{tokenize, LexicalIndex};
pub use normalize::{expand, normalize};
