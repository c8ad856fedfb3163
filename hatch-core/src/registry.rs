//! Registry document access.
//!
//! The registry is a single JSON file owned by the external registry CLI.
//! This layer treats it as opaque bytes: it checks that the file parses as
//! JSON, hashes it, snapshots it, and restores it. The only structural read
//! is [`RegistrySnapshot::has_repository`].
//!
//! # API pattern
//!
//! Functions take the registry path explicitly; tests pass a `TempDir` path.

use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{registry_io_err, RegistryError};

/// Registry file contents captured at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySnapshot {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    /// Lowercase hex SHA-256 of `bytes`.
    pub digest: String,
}

impl RegistrySnapshot {
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self, RegistryError> {
        let path = path.into();
        serde_json::from_slice::<Value>(&bytes)
            .map_err(|source| RegistryError::Parse {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            digest: digest(&bytes),
            path,
            bytes,
        })
    }

    pub fn document(&self) -> Result<Value, RegistryError> {
        serde_json::from_slice(&self.bytes).map_err(|source| RegistryError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Pretty-printed JSON with LF line endings; stable input for line diffs.
    pub fn pretty(&self) -> Result<String, RegistryError> {
        let doc = self.document()?;
        let mut text = serde_json::to_string_pretty(&doc).map_err(|source| {
            RegistryError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        text.push('\n');
        Ok(text)
    }

    /// Whether `repositories[*].name` contains `name`.
    pub fn has_repository(&self, name: &str) -> Result<bool, RegistryError> {
        let doc = self.document()?;
        Ok(doc
            .get("repositories")
            .and_then(Value::as_array)
            .map(|repos| {
                repos
                    .iter()
                    .any(|repo| repo.get("name").and_then(Value::as_str) == Some(name))
            })
            .unwrap_or(false))
    }

    /// Write these bytes back to `path`, replacing whatever is there now.
    pub fn restore(&self) -> Result<(), RegistryError> {
        write_atomic(&self.path, &self.bytes)
    }
}

/// Load the registry at `path`.
///
/// Returns `RegistryError::RegistryNotFound` if absent and
/// `RegistryError::Parse` if the file is not JSON.
pub fn load_at(path: &Path) -> Result<RegistrySnapshot, RegistryError> {
    if !path.exists() {
        return Err(RegistryError::RegistryNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|e| registry_io_err(path, e))?;
    RegistrySnapshot::from_bytes(path, bytes)
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Atomically replace `path` with `bytes`.
///
/// Write flow: `<name>.tmp` sibling → `rename`. The `.tmp` lives in the same
/// directory as the target so the rename never crosses filesystems.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RegistryError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| registry_io_err(parent, e))?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "registry.json".to_string());
    let tmp = path.with_file_name(format!("{file_name}.tmp"));
    std::fs::write(&tmp, bytes).map_err(|e| registry_io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(registry_io_err(path, e));
    }
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "registry file written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
