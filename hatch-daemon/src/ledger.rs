//! Idempotency ledger: dispatch keys the daemon has already handled.
//!
//! Keys are `<type>:<workflow_id>:<run_id>`. Only jobs that ran to an
//! outcome are recorded; a job that errored (download failure, rolled-back
//! mutation) can be resubmitted.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hatch_core::types::RunStatus;

use crate::error::{io_err, DaemonError};
use crate::paths::{dispatch_dir, ledger_path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub status: RunStatus,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    pub fn get(&self, key: &str) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    pub fn record(&mut self, key: impl Into<String>, status: RunStatus, at: DateTime<Utc>) {
        self.entries.insert(
            key.into(),
            LedgerEntry {
                status,
                recorded_at: at,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load the ledger. Returns an empty ledger if the file does not yet exist.
pub fn load_at(state_dir: &Path) -> Result<Ledger, DaemonError> {
    let path = ledger_path(state_dir);
    if !path.exists() {
        return Ok(Ledger::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Save the ledger atomically via `<path>.tmp` + rename.
pub fn save_at(state_dir: &Path, ledger: &Ledger) -> Result<(), DaemonError> {
    let dir = dispatch_dir(state_dir);
    std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

    let path = ledger_path(state_dir);
    let json = serde_json::to_string_pretty(ledger)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty_ledger() {
        let state = TempDir::new().unwrap();
        assert!(load_at(state.path()).unwrap().is_empty());
    }

    #[test]
    fn save_then_load_keeps_entries() {
        let state = TempDir::new().unwrap();
        let mut ledger = Ledger::default();
        ledger.record("validate-package:wf:1", RunStatus::Failed, Utc::now());
        ledger.record("add-package:wf:2", RunStatus::Succeeded, Utc::now());

        save_at(state.path(), &ledger).unwrap();
        let loaded = load_at(state.path()).unwrap();
        assert_eq!(loaded, ledger);
        assert_eq!(
            loaded.get("validate-package:wf:1").unwrap().status,
            RunStatus::Failed
        );
        assert!(!ledger_path(state.path()).with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_ledger_is_an_error() {
        let state = TempDir::new().unwrap();
        std::fs::create_dir_all(dispatch_dir(state.path())).unwrap();
        std::fs::write(ledger_path(state.path()), "not json").unwrap();
        assert!(matches!(load_at(state.path()), Err(DaemonError::Json(_))));
    }
}
