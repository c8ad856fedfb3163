//! Seams to the systems this layer coordinates but does not implement.
//!
//! Process-backed implementations live in [`crate::github`] and
//! [`crate::registry_cli`]; tests substitute in-memory fakes.

use std::path::Path;

use hatch_core::types::{ArtifactRef, Author, OutboundEvent, PrNumber, RepoSlug, ValidationResult};

use crate::error::PipelineError;
use crate::process::CommandOutput;

/// Fetches a named build artifact produced by an external workflow run.
pub trait ArtifactSource: Send + Sync {
    /// Download into `dest`, which exists and is empty.
    fn download(&self, artifact: &ArtifactRef, dest: &Path) -> Result<(), PipelineError>;
}

/// Runs the external package validator.
///
/// Infallible by signature: a validator that cannot start is reported as a
/// failed [`ValidationResult`] whose log carries the reason.
pub trait PackageValidator: Send + Sync {
    fn validate(&self, repository_name: &str, package_dir: &Path) -> ValidationResult;
}

/// Labels and comments on the originating pull request.
pub trait PullRequestFeedback: Send + Sync {
    fn add_labels(
        &self,
        repository: &RepoSlug,
        pr: PrNumber,
        labels: &[String],
    ) -> Result<(), PipelineError>;

    fn comment(&self, repository: &RepoSlug, pr: PrNumber, body: &str)
        -> Result<(), PipelineError>;
}

/// Sends a dispatch event to another repository. Fire-and-forget.
pub trait EventForwarder: Send + Sync {
    fn forward(&self, repository: &RepoSlug, event: &OutboundEvent) -> Result<(), PipelineError>;
}

/// Mutating commands of the external registry CLI.
///
/// Returns the captured output even on a non-zero exit; the caller decides
/// what a failure means.
pub trait RegistryCli: Send + Sync {
    fn add_repository(&self, name: &str, url: &str) -> Result<CommandOutput, PipelineError>;

    fn add_package(
        &self,
        repository_name: &str,
        package_dir: &Path,
        author: &Author,
    ) -> Result<CommandOutput, PipelineError>;
}

/// Hosts published registry releases.
pub trait ReleaseHost: Send + Sync {
    /// Publish `asset` under `tag`. With `replace`, a release with the same
    /// tag already exists on the host and its asset and notes are replaced.
    fn publish(
        &self,
        tag: &str,
        notes: &str,
        asset: &Path,
        replace: bool,
    ) -> Result<(), PipelineError>;
}
