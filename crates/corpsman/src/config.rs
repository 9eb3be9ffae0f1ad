//! Engine configuration.
//!
//! Everything operational lives here: where the corpus artifacts sit,
//! which artifact names to probe, how wide retrieval casts. Clinical
//! numbers belong in [`crate::policy`], not here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default config file path.
pub const CONFIG_PATH: &str = "/etc/corpsman/config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the guideline corpus artifacts.
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: PathBuf,

    /// Artifact filenames in preference order. The first one present
    /// wins; later names are thinner fallbacks.
    #[serde(default = "default_artifacts")]
    pub artifacts: Vec<String>,

    /// How many candidates retrieval considers per query.
    #[serde(default = "default_retrieval_top_n")]
    pub retrieval_top_n: usize,

    /// Optional clinical policy override file.
    #[serde(default)]
    pub policy_path: Option<PathBuf>,
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("/var/lib/corpsman/corpus")
}

fn default_artifacts() -> Vec<String> {
    vec![
        "guidelines_comprehensive.json".to_string(),
        "guidelines_focused.json".to_string(),
        "guidelines_legacy.json".to_string(),
    ]
}

fn default_retrieval_top_n() -> usize {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            artifacts: default_artifacts(),
            retrieval_top_n: default_retrieval_top_n(),
            policy_path: None,
        }
    }
}

impl EngineConfig {
    /// Load from the default path, falling back to compiled defaults.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(CONFIG_PATH)).unwrap_or_else(|| {
            warn!("No config found at {CONFIG_PATH}, using defaults");
            Self::default()
        })
    }

    /// Load from a specific path. None when the file is missing or
    /// does not parse; the caller decides what the fallback is.
    pub fn load_from_path(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                warn!("Invalid config at {}: {}", path.display(), e);
                None
            }
        }
    }
}
