//! Release store: dated registry snapshots and the release index.
//!
//! ```text
//! <state_dir>/releases/
//!   index.json               (ReleaseIndex, newest last)
//!   <YYYY-MM-DD>/
//!     release.json           (ReleaseRecord)
//!     RELEASE_NOTES.md
//!     <asset_name>           (registry bytes exactly as released)
//! ```
//!
//! Writes use the same atomic `.tmp` + rename pattern as the registry: a
//! release directory is staged as `.<tag>.tmp/` and only renamed into place
//! once it has been published.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, PipelineError};

pub const MANIFEST_FILE: &str = "release.json";
pub const NOTES_FILE: &str = "RELEASE_NOTES.md";

/// One published release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub tag: String,
    pub created_at: DateTime<Utc>,
    /// SHA-256 of the snapshot bytes.
    pub digest: String,
    pub forced: bool,
    pub previous_tag: Option<String>,
}

/// On-disk release index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseIndex {
    pub releases: Vec<ReleaseRecord>,
}

impl ReleaseIndex {
    pub fn latest(&self) -> Option<&ReleaseRecord> {
        self.releases.last()
    }

    pub fn find(&self, tag: &str) -> Option<&ReleaseRecord> {
        self.releases.iter().find(|r| r.tag == tag)
    }

    /// The release before `tag`, or the latest release when `tag` is absent.
    pub fn previous_to(&self, tag: &str) -> Option<&ReleaseRecord> {
        match self.releases.iter().position(|r| r.tag == tag) {
            Some(0) => None,
            Some(i) => self.releases.get(i - 1),
            None => self.latest(),
        }
    }

    /// Replace the record with the same tag in place, or append.
    pub fn upsert(&mut self, record: ReleaseRecord) {
        match self.releases.iter_mut().find(|r| r.tag == record.tag) {
            Some(existing) => *existing = record,
            None => self.releases.push(record),
        }
    }
}

/// `<state_dir>/releases/`
pub fn releases_dir_at(state_dir: &Path) -> PathBuf {
    state_dir.join("releases")
}

/// `<state_dir>/releases/index.json`
pub fn index_path_at(state_dir: &Path) -> PathBuf {
    releases_dir_at(state_dir).join("index.json")
}

/// `<state_dir>/releases/<tag>/`
pub fn release_dir_at(state_dir: &Path, tag: &str) -> PathBuf {
    releases_dir_at(state_dir).join(tag)
}

/// Load the release index.
///
/// Returns an empty index if the file does not yet exist.
pub fn load_at(state_dir: &Path) -> Result<ReleaseIndex, PipelineError> {
    let path = index_path_at(state_dir);
    if !path.exists() {
        return Ok(ReleaseIndex::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Save the release index atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(state_dir: &Path, index: &ReleaseIndex) -> Result<(), PipelineError> {
    let path = index_path_at(state_dir);
    let dir = releases_dir_at(state_dir);
    std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

    let json = serde_json::to_string_pretty(index)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// Assemble a release in `.<tag>.tmp/` next to the published releases.
///
/// Nothing under `releases/<tag>/` changes until [`commit_release_at`].
pub fn stage_release_at(
    state_dir: &Path,
    record: &ReleaseRecord,
    asset_name: &str,
    snapshot: &[u8],
    notes: &str,
) -> Result<PathBuf, PipelineError> {
    let staging = staging_dir_at(state_dir, &record.tag);
    if staging.exists() {
        std::fs::remove_dir_all(&staging).map_err(|e| io_err(&staging, e))?;
    }
    std::fs::create_dir_all(&staging).map_err(|e| io_err(&staging, e))?;

    let write = |name: &str, bytes: &[u8]| -> Result<(), PipelineError> {
        let path = staging.join(name);
        std::fs::write(&path, bytes).map_err(|e| io_err(&path, e))
    };
    let staged = write(asset_name, snapshot)
        .and_then(|()| write(NOTES_FILE, notes.as_bytes()))
        .and_then(|()| write(MANIFEST_FILE, serde_json::to_string_pretty(record)?.as_bytes()));
    if let Err(err) = staged {
        discard_staged(&staging);
        return Err(err);
    }
    Ok(staging)
}

/// Move a staged release into `releases/<tag>/`, replacing any existing one.
///
/// The old directory is parked as `.<tag>.old/` until the new one is in
/// place and put back if the swap fails. Returns the final directory path.
pub fn commit_release_at(
    state_dir: &Path,
    tag: &str,
    staging: &Path,
) -> Result<PathBuf, PipelineError> {
    let target = release_dir_at(state_dir, tag);
    let parked = releases_dir_at(state_dir).join(format!(".{tag}.old"));

    if parked.exists() {
        std::fs::remove_dir_all(&parked).map_err(|e| io_err(&parked, e))?;
    }
    let had_previous = target.exists();
    if had_previous {
        std::fs::rename(&target, &parked).map_err(|e| io_err(&target, e))?;
    }

    if let Err(e) = std::fs::rename(staging, &target) {
        if had_previous {
            if let Err(restore) = std::fs::rename(&parked, &target) {
                tracing::error!(tag, error = %restore, "could not restore previous release directory");
            }
        }
        discard_staged(staging);
        return Err(io_err(&target, e));
    }

    if had_previous {
        if let Err(err) = std::fs::remove_dir_all(&parked) {
            tracing::warn!(path = %parked.display(), error = %err, "stale release directory left behind");
        }
    }
    Ok(target)
}

/// Remove a staged release that will not be committed.
pub fn discard_staged(staging: &Path) {
    if let Err(err) = std::fs::remove_dir_all(staging) {
        tracing::warn!(path = %staging.display(), error = %err, "could not remove staged release");
    }
}

fn staging_dir_at(state_dir: &Path, tag: &str) -> PathBuf {
    releases_dir_at(state_dir).join(format!(".{tag}.tmp"))
}

/// Registry bytes embedded in the release `tag`.
pub fn load_snapshot_at(
    state_dir: &Path,
    tag: &str,
    asset_name: &str,
) -> Result<Vec<u8>, PipelineError> {
    let path = release_dir_at(state_dir, tag).join(asset_name);
    std::fs::read(&path).map_err(|e| io_err(&path, e))
}
