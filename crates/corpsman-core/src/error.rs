//! Error types for the recall layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecallError {
    #[error("No guideline corpus found. Searched: {searched}")]
    CorpusMissing { searched: String },

    #[error("Corpus artifact {path} is malformed: {source}")]
    CorpusFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corpus artifact {0} contains no entries")]
    EmptyCorpus(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RecallResult<T> = Result<T, RecallError>;
