//! Registry mutation for `add-package` events.
//!
//! ## Protocol
//!
//! 1. Download the artifact (fatal on failure, registry untouched).
//! 2. Take an exclusive lock on `<registry>.lock`.
//! 3. Snapshot the registry bytes, or note that the file does not exist yet.
//! 4. `add-repository` if the repository name is not registered yet.
//! 5. `add-package`.
//! 6. On any failure in 4–5 restore the snapshot before the lock is released.
//!    A registry that did not exist before is removed again.
//!
//! The registry CLI creates an empty registry on first use, so a missing file
//! is a first package rather than an error.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use hatch_core::error::RegistryError;
use hatch_core::registry::{self, RegistrySnapshot};
use hatch_core::types::AddPackageRequest;

use crate::collaborators::{ArtifactSource, RegistryCli};
use crate::error::{io_err, PipelineError};
use crate::process::CommandOutput;
use crate::workdir::WorkDir;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);
const LOCK_POLL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Registry lock
// ---------------------------------------------------------------------------

/// Exclusive advisory lock on `<registry>.lock`; released on drop.
#[derive(Debug)]
pub struct RegistryLock {
    file: File,
    path: PathBuf,
}

impl RegistryLock {
    pub fn lock_path(registry_path: &Path) -> PathBuf {
        let name = registry_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "registry".to_string());
        registry_path.with_file_name(format!("{name}.lock"))
    }

    /// Poll for the lock until `timeout` elapses.
    pub fn acquire(registry_path: &Path, timeout: Duration) -> Result<Self, PipelineError> {
        let path = Self::lock_path(registry_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| io_err(&path, e))?;

        let started = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    tracing::debug!(
                        path = %path.display(),
                        waited_ms = started.elapsed().as_millis() as u64,
                        "registry lock acquired"
                    );
                    return Ok(Self { file, path });
                }
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if started.elapsed() >= timeout {
                        return Err(PipelineError::Lock {
                            path,
                            reason: format!("still held after {}s", timeout.as_secs()),
                        });
                    }
                    std::thread::sleep(LOCK_POLL);
                }
                Err(e) => {
                    return Err(PipelineError::Lock {
                        path,
                        reason: e.to_string(),
                    })
                }
            }
        }
    }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %err, "registry unlock failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Baseline
// ---------------------------------------------------------------------------

/// The registry as it was before a mutation.
#[derive(Debug)]
enum Baseline {
    Present(RegistrySnapshot),
    Absent(PathBuf),
}

impl Baseline {
    fn capture(registry_path: &Path) -> Result<Self, PipelineError> {
        match registry::load_at(registry_path) {
            Ok(snapshot) => Ok(Baseline::Present(snapshot)),
            Err(RegistryError::RegistryNotFound { path }) => {
                tracing::info!(path = %path.display(), "registry not found, the CLI will create it");
                Ok(Baseline::Absent(path))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn has_repository(&self, name: &str) -> Result<bool, PipelineError> {
        match self {
            Baseline::Present(snapshot) => Ok(snapshot.has_repository(name)?),
            Baseline::Absent(_) => Ok(false),
        }
    }

    fn digest(&self) -> Option<&str> {
        match self {
            Baseline::Present(snapshot) => Some(&snapshot.digest),
            Baseline::Absent(_) => None,
        }
    }

    fn restore(&self) -> Result<(), PipelineError> {
        match self {
            Baseline::Present(snapshot) => Ok(snapshot.restore()?),
            Baseline::Absent(path) => match std::fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(io_err(path, e)),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// RegistryMutator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationReport {
    pub repository: String,
    pub package_name: String,
    pub version: String,
    /// Whether `add-repository` ran before `add-package`.
    pub repository_added: bool,
    /// `None` when this mutation created the registry.
    pub digest_before: Option<String>,
    pub digest_after: String,
    /// Combined output of every registry CLI call, in order.
    pub log: String,
}

pub struct RegistryMutator {
    artifacts: Arc<dyn ArtifactSource>,
    cli: Arc<dyn RegistryCli>,
    registry_path: PathBuf,
    work_root: PathBuf,
    lock_timeout: Duration,
}

impl RegistryMutator {
    pub fn new(
        artifacts: Arc<dyn ArtifactSource>,
        cli: Arc<dyn RegistryCli>,
        registry_path: PathBuf,
        work_root: PathBuf,
    ) -> Self {
        Self {
            artifacts,
            cli,
            registry_path,
            work_root,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn add_package(&self, request: &AddPackageRequest) -> Result<MutationReport, PipelineError> {
        let artifact = &request.artifact;
        let repository = artifact.repository.name();
        let span = tracing::info_span!(
            "add_package",
            repository,
            package = %request.package_name,
            version = %request.version,
        );
        let _guard = span.enter();

        let work_dir = WorkDir::for_artifact(&self.work_root, artifact)?;
        self.artifacts.download(artifact, work_dir.path())?;

        let _lock = RegistryLock::acquire(&self.registry_path, self.lock_timeout)?;
        let baseline = Baseline::capture(&self.registry_path)?;

        let mut log = Vec::new();
        let outcome = self.apply(request, work_dir.path(), &baseline, &mut log);
        let log = log.join("\n");

        let repository_added = match outcome {
            Ok(added) => added,
            Err(err) => {
                baseline.restore()?;
                tracing::warn!(error = %err, "registry mutation rolled back");
                let log = if log.is_empty() { err.to_string() } else { log };
                return Err(PipelineError::RegistryMutation {
                    repository: repository.to_string(),
                    log,
                });
            }
        };

        let after = registry::load_at(&self.registry_path);
        let digest_after = match after {
            Ok(after) => after.digest,
            Err(err) => {
                baseline.restore()?;
                return Err(PipelineError::RegistryMutation {
                    repository: repository.to_string(),
                    log: format!("{log}\nregistry unreadable after add-package: {err}"),
                });
            }
        };

        let digest_before = baseline.digest().map(str::to_string);
        tracing::info!(
            digest_before = digest_before.as_deref().unwrap_or("none"),
            %digest_after,
            "package added"
        );
        Ok(MutationReport {
            repository: repository.to_string(),
            package_name: request.package_name.to_string(),
            version: request.version.clone(),
            repository_added,
            digest_before,
            digest_after,
            log,
        })
    }

    /// Steps 4–5. Returns whether the repository was added.
    fn apply(
        &self,
        request: &AddPackageRequest,
        package_dir: &Path,
        baseline: &Baseline,
        log: &mut Vec<String>,
    ) -> Result<bool, PipelineError> {
        let slug = &request.artifact.repository;
        let mut added = false;

        if !baseline.has_repository(slug.name())? {
            let out = self.cli.add_repository(slug.name(), &slug.url())?;
            record(log, &out);
            require_success("add-repository", &out)?;
            added = true;
        }

        let out = self
            .cli
            .add_package(slug.name(), package_dir, &request.author)?;
        record(log, &out);
        require_success("add-package", &out)?;
        Ok(added)
    }
}

fn record(log: &mut Vec<String>, out: &CommandOutput) {
    let text = out.combined();
    if !text.is_empty() {
        log.push(text);
    }
}

fn require_success(step: &str, out: &CommandOutput) -> Result<(), PipelineError> {
    if out.success() {
        return Ok(());
    }
    Err(PipelineError::CommandFailed {
        program: "registry".to_string(),
        args: step.to_string(),
        code: out.code,
        output: out.combined(),
    })
}
