//! Guideline corpus store.
//!
//! Entries are loaded once at startup from the best available JSON artifact
//! and never mutated afterwards. Entry position doubles as the document id,
//! which is what makes ranking ties reproducible.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RecallError, RecallResult};

/// One retrievable chunk of guideline text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub text: String,
    pub source: String,
    #[serde(default)]
    pub section: String,
    /// Coarse topic label. Legacy artifacts omit it.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub page: u32,
    /// Editorial weight assigned at corpus build time, 1-5.
    #[serde(default)]
    pub priority_score: f32,
}

/// Immutable corpus, in artifact order.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    entries: Vec<CorpusEntry>,
    loaded_from: PathBuf,
}

impl CorpusStore {
    /// Load the first artifact from `names` that exists under `dir`.
    ///
    /// The name list is ordered best-first (comprehensive before focused
    /// before legacy). No artifact at all is fatal: the engine cannot
    /// answer anything without a corpus.
    pub fn load(dir: &Path, names: &[String]) -> RecallResult<Self> {
        for name in names {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }
            let raw = fs::read_to_string(&path)?;
            let entries: Vec<CorpusEntry> =
                serde_json::from_str(&raw).map_err(|source| RecallError::CorpusFormat {
                    path: path.display().to_string(),
                    source,
                })?;
            if entries.is_empty() {
                return Err(RecallError::EmptyCorpus(path.display().to_string()));
            }
            return Ok(Self {
                entries,
                loaded_from: path,
            });
        }
        let searched = names
            .iter()
            .map(|n| dir.join(n).display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(RecallError::CorpusMissing { searched })
    }

    /// Build a store directly from entries (fixtures, embedded corpora).
    pub fn from_entries(entries: Vec<CorpusEntry>) -> Self {
        Self {
            entries,
            loaded_from: PathBuf::from("<memory>"),
        }
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn get(&self, doc_id: usize) -> Option<&CorpusEntry> {
        self.entries.get(doc_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path of the artifact this corpus came from.
    pub fn loaded_from(&self) -> &Path {
        &self.loaded_from
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_artifact(dir: &Path, name: &str, body: &str) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn test_loads_best_artifact_first() {
        let tmp = TempDir::new().unwrap();
        write_artifact(
            tmp.path(),
            "comprehensive.json",
            r#"[{"text":"full entry","source":"Hemorrhage Control","section":"Treatment","category":"hemorrhage","page":3,"priority_score":5.0}]"#,
        );
        write_artifact(
            tmp.path(),
            "legacy.json",
            r#"[{"text":"old entry","source":"Old Guide"}]"#,
        );

        let names = vec!["comprehensive.json".to_string(), "legacy.json".to_string()];
        let store = CorpusStore::load(tmp.path(), &names).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().text, "full entry");
        assert!(store.loaded_from().ends_with("comprehensive.json"));
    }

    #[test]
    fn test_falls_back_to_legacy_artifact() {
        let tmp = TempDir::new().unwrap();
        write_artifact(
            tmp.path(),
            "legacy.json",
            r#"[{"text":"old entry","source":"Old Guide"}]"#,
        );

        let names = vec!["comprehensive.json".to_string(), "legacy.json".to_string()];
        let store = CorpusStore::load(tmp.path(), &names).unwrap();
        assert_eq!(store.len(), 1);
        // Missing fields default instead of failing deserialization.
        let entry = store.get(0).unwrap();
        assert_eq!(entry.section, "");
        assert_eq!(entry.page, 0);
        assert_eq!(entry.priority_score, 0.0);
    }

    #[test]
    fn test_no_artifact_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let names = vec!["comprehensive.json".to_string()];
        let err = CorpusStore::load(tmp.path(), &names).unwrap_err();
        assert!(matches!(err, RecallError::CorpusMissing { .. }));
    }

    #[test]
    fn test_empty_artifact_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write_artifact(tmp.path(), "comprehensive.json", "[]");
        let names = vec!["comprehensive.json".to_string()];
        let err = CorpusStore::load(tmp.path(), &names).unwrap_err();
        assert!(matches!(err, RecallError::EmptyCorpus(_)));
    }

    #[test]
    fn test_malformed_artifact_reports_path() {
        let tmp = TempDir::new().unwrap();
        write_artifact(tmp.path(), "comprehensive.json", "{not json");
        let names = vec!["comprehensive.json".to_string()];
        let err = CorpusStore::load(tmp.path(), &names).unwrap_err();
        match err {
            RecallError::CorpusFormat { path, .. } => {
                assert!(path.contains("comprehensive.json"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
