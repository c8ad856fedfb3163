//! Per-run scratch directories for downloaded artifacts.

use std::path::{Path, PathBuf};

use hatch_core::types::ArtifactRef;

use crate::error::{io_err, PipelineError};

/// A fresh directory under the work root, removed again on drop.
#[derive(Debug)]
pub(crate) struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    /// `<root>/<run_id>-<artifact_name>`, emptied if it already exists.
    pub(crate) fn for_artifact(root: &Path, artifact: &ArtifactRef) -> Result<Self, PipelineError> {
        let name = sanitize(&format!("{}-{}", artifact.run_id, artifact.artifact_name));
        let path = root.join(name);
        if path.exists() {
            std::fs::remove_dir_all(&path).map_err(|e| io_err(&path, e))?;
        }
        std::fs::create_dir_all(&path).map_err(|e| io_err(&path, e))?;
        Ok(Self { path })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_dir_all(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %err, "work dir not removed");
        }
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
