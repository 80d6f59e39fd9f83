//! Known-issue ledger.
//!
//! Maps each repo to the set of issue numbers observed at the last
//! successful poll. A repo the ledger has never seen is [`LedgerEntry::Unknown`],
//! which is distinct from "seen with zero issues" — the first observation of
//! a repo seeds its set without triggering notifications.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::Result;

/// Ledger state for a single repo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntry {
    /// Repo has never been polled successfully.
    Unknown,
    /// Issue numbers seen at the last successful poll.
    Known(BTreeSet<u64>),
}

impl LedgerEntry {
    /// Whether this repo has been observed before.
    pub fn is_known(&self) -> bool {
        matches!(self, LedgerEntry::Known(_))
    }
}

/// On-disk shape: repo → sorted array of issue numbers. `BTreeMap` and
/// `BTreeSet` keep the serialized form stable across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerFile {
    repos: BTreeMap<String, BTreeSet<u64>>,
}

/// Persisted known-issue ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    repos: BTreeMap<String, BTreeSet<u64>>,
}

impl Ledger {
    /// Load the ledger from `path`, starting empty if the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        let file: LedgerFile = read_json_optional(path)?.unwrap_or_default();
        debug!(path = %path.display(), repos = file.repos.len(), "Loaded ledger");
        Ok(Self {
            path: path.to_path_buf(),
            repos: file.repos,
        })
    }

    /// Ledger entry for a repo.
    pub fn entry(&self, repo: &str) -> LedgerEntry {
        match self.repos.get(repo) {
            Some(set) => LedgerEntry::Known(set.clone()),
            None => LedgerEntry::Unknown,
        }
    }

    /// Record the live issue set for a repo. The repo becomes `Known` even
    /// when the set is empty.
    pub fn record(&mut self, repo: &str, numbers: BTreeSet<u64>) {
        self.repos.insert(repo.to_string(), numbers);
    }

    /// Persist the ledger atomically.
    pub fn save(&self) -> Result<()> {
        let file = LedgerFile {
            repos: self.repos.clone(),
        };
        atomic_write_json(&self.path, &file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::load(&dir.path().join("ledger.json")).unwrap();
        assert_eq!(ledger.entry("owner/repo"), LedgerEntry::Unknown);
    }

    #[test]
    fn record_makes_repo_known_even_when_empty() {
        let dir = tempdir().unwrap();
        let mut ledger = Ledger::load(&dir.path().join("ledger.json")).unwrap();

        ledger.record("owner/repo", BTreeSet::new());

        assert_eq!(
            ledger.entry("owner/repo"),
            LedgerEntry::Known(BTreeSet::new())
        );
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.record("owner/repo", BTreeSet::from([1, 2, 3]));
        ledger.save().unwrap();

        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(
            reloaded.entry("owner/repo"),
            LedgerEntry::Known(BTreeSet::from([1, 2, 3]))
        );
        assert_eq!(reloaded.entry("other/repo"), LedgerEntry::Unknown);
    }

    #[test]
    fn serialized_form_is_sorted_arrays() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.record("owner/repo", BTreeSet::from([3, 1, 2]));
        ledger.save().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["repos"]["owner/repo"], serde_json::json!([1, 2, 3]));
    }
}
