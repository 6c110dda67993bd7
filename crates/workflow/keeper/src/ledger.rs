//! Idempotency ledger: which escalations this keeper already drove
//!
//! The engine rejects a duplicate escalation on its own, so the ledger
//! is not load-bearing for correctness. What it buys is quietness: a
//! keeper that crashes after escalating and restarts does not re-issue
//! calls it knows will fail, and operators reading its logs see each
//! escalation exactly once.
//!
//! Keys are the derived task address prefixed with the action, so one
//! ledger can serve several workspaces without collisions.

use crate::errors::{KeeperError, KeeperResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use workflow_types::RunId;

// ── Ledger ───────────────────────────────────────────────────────────

/// Record of escalations already driven, plus the last cycle time
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperLedger {
    /// Escalation key to the time the keeper handled it
    #[serde(default)]
    processed: HashMap<String, DateTime<Utc>>,
    /// When the last cycle finished
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
}

impl KeeperLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger key for escalating task `task_index` of `run`
    pub fn escalation_key(run: &RunId, task_index: u16) -> String {
        format!("escalate/{}/{}", run, task_index)
    }

    pub fn is_processed(&self, key: &str) -> bool {
        self.processed.contains_key(key)
    }

    pub fn mark_processed(&mut self, key: impl Into<String>, now: DateTime<Utc>) {
        self.processed.insert(key.into(), now);
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}

// ── Persistence ──────────────────────────────────────────────────────

/// Storage seam for the ledger
pub trait LedgerStore: Send + Sync {
    /// Load the ledger; a store with no ledger yet yields an empty one
    fn load(&self) -> KeeperResult<KeeperLedger>;

    /// Persist the ledger so a restarted keeper resumes where this one
    /// stopped
    fn save(&self, ledger: &KeeperLedger) -> KeeperResult<()>;
}

/// Ledger persisted as a JSON file.
///
/// Saves write a sibling `.tmp` file and rename it into place, so a
/// crash mid-write leaves the previous ledger intact.
#[derive(Clone, Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
}

impl JsonFileLedger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for JsonFileLedger {
    fn load(&self) -> KeeperResult<KeeperLedger> {
        if !self.path.exists() {
            return Ok(KeeperLedger::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let ledger = serde_json::from_str(&contents)?;
        Ok(ledger)
    }

    fn save(&self, ledger: &KeeperLedger) -> KeeperResult<()> {
        let json = serde_json::to_string_pretty(ledger)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), entries = ledger.len(), "ledger saved");
        Ok(())
    }
}

/// Ledger held in memory, for tests and ephemeral keepers
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    inner: Mutex<KeeperLedger>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedger {
    fn load(&self) -> KeeperResult<KeeperLedger> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| KeeperError::Io(std::io::Error::other(e.to_string())))?;
        Ok(inner.clone())
    }

    fn save(&self, ledger: &KeeperLedger) -> KeeperResult<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| KeeperError::Io(std::io::Error::other(e.to_string())))?;
        *inner = ledger.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use workflow_types::WorkspaceId;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_escalation_key_is_scoped_by_run_and_index() {
        let ws = WorkspaceId::new("workspace/alice");
        let run = RunId::derive(&ws, 0);
        assert_eq!(
            KeeperLedger::escalation_key(&run, 2),
            "escalate/run/workspace/alice/0/2"
        );
        assert_ne!(
            KeeperLedger::escalation_key(&run, 1),
            KeeperLedger::escalation_key(&RunId::derive(&ws, 1), 1)
        );
    }

    #[test]
    fn test_mark_and_check() {
        let mut ledger = KeeperLedger::new();
        assert!(ledger.is_empty());
        assert!(!ledger.is_processed("escalate/run/x/0"));

        ledger.mark_processed("escalate/run/x/0", t0());
        assert!(ledger.is_processed("escalate/run/x/0"));
        assert_eq!(ledger.len(), 1);

        // Re-marking is a no-op overwrite, not a duplicate.
        ledger.mark_processed("escalate/run/x/0", t0());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_json_file_ledger_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileLedger::new(dir.path().join("ledger.json"));

        let mut ledger = KeeperLedger::new();
        ledger.mark_processed("escalate/run/workspace/alice/0/0", t0());
        ledger.last_run_at = Some(t0());
        store.save(&ledger).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, ledger);
        // No stray tmp file left behind.
        assert!(!dir.path().join("ledger.tmp").exists());
    }

    #[test]
    fn test_missing_file_loads_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileLedger::new(dir.path().join("absent.json"));

        let ledger = store.load().unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.last_run_at, None);
    }

    #[test]
    fn test_corrupt_file_is_an_error_not_a_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonFileLedger::new(&path).load().unwrap_err();
        assert!(matches!(err, KeeperError::Serialization(_)));
    }

    #[test]
    fn test_in_memory_ledger_persists_across_loads() {
        let store = InMemoryLedger::new();
        let mut ledger = store.load().unwrap();
        ledger.mark_processed("escalate/run/x/0", t0());
        store.save(&ledger).unwrap();

        assert!(store.load().unwrap().is_processed("escalate/run/x/0"));
    }
}
