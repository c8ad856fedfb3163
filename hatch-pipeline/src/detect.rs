//! Change detection for the registry publisher.

use std::path::{Path, PathBuf};

use hatch_core::config::{ChangeDetectorKind, ReleaseConfig};
use hatch_core::registry::RegistrySnapshot;

use crate::error::PipelineError;
use crate::process::Invocation;
use crate::release_store::ReleaseRecord;

/// Decides whether the registry changed since the previous release.
pub trait ChangeDetector: Send + Sync {
    fn has_changed(
        &self,
        current: &RegistrySnapshot,
        previous: Option<&ReleaseRecord>,
    ) -> Result<bool, PipelineError>;
}

/// Compares the current digest with the digest recorded by the last release.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestDetector;

impl ChangeDetector for DigestDetector {
    fn has_changed(
        &self,
        current: &RegistrySnapshot,
        previous: Option<&ReleaseRecord>,
    ) -> Result<bool, PipelineError> {
        Ok(previous.map_or(true, |prev| prev.digest != current.digest))
    }
}

/// `git diff --quiet <base> <head> -- <registry>` between two commits.
///
/// Exit 1 means changed, 0 unchanged; any other status is an error. The
/// previous release is ignored: the commit range defines "since last time".
#[derive(Debug, Clone)]
pub struct GitDiffDetector {
    program: String,
    base: String,
    head: String,
}

impl GitDiffDetector {
    pub fn new(base: impl Into<String>, head: impl Into<String>) -> Self {
        Self::with_program("git", base, head)
    }

    pub fn with_program(
        program: impl Into<String>,
        base: impl Into<String>,
        head: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            base: base.into(),
            head: head.into(),
        }
    }
}

impl ChangeDetector for GitDiffDetector {
    fn has_changed(
        &self,
        current: &RegistrySnapshot,
        _previous: Option<&ReleaseRecord>,
    ) -> Result<bool, PipelineError> {
        let (dir, file) = split_path(&current.path);
        let out = Invocation::new(&self.program)
            .args(["diff", "--quiet"])
            .arg(&self.base)
            .arg(&self.head)
            .arg("--")
            .arg(&file)
            .current_dir(&dir)
            .capture()?;
        match out.code {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            code => Err(PipelineError::ChangeDetection(format!(
                "git diff {}..{} exited with {code:?}: {}",
                self.base,
                self.head,
                out.combined()
            ))),
        }
    }
}

/// Run git from the registry's directory so relative pathspecs resolve.
fn split_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| path.to_path_buf());
    (dir, file)
}

/// Detector selected by configuration.
pub fn from_config(release: &ReleaseConfig) -> Box<dyn ChangeDetector> {
    match release.detector {
        ChangeDetectorKind::Digest => Box::new(DigestDetector),
        ChangeDetectorKind::Git => Box::new(GitDiffDetector::new(
            release.git_base.clone(),
            release.git_head.clone(),
        )),
    }
}
