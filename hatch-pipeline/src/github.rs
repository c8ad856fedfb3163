//! GitHub collaborators backed by the `gh` CLI.
//!
//! Authentication is whatever `gh` is configured with (`GH_TOKEN` in CI).

use std::path::Path;

use hatch_core::types::{ArtifactRef, OutboundEvent, PrNumber, RepoSlug};

use crate::collaborators::{ArtifactSource, EventForwarder, PullRequestFeedback, ReleaseHost};
use crate::error::PipelineError;
use crate::process::Invocation;

/// `gh` program handle.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
}

impl GhCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn invocation(&self) -> Invocation<'_> {
        Invocation::new(&self.program)
    }
}

fn github_err(action: &str, err: PipelineError) -> PipelineError {
    PipelineError::GitHub {
        action: action.to_string(),
        reason: err.to_string(),
    }
}

impl ArtifactSource for GhCli {
    fn download(&self, artifact: &ArtifactRef, dest: &Path) -> Result<(), PipelineError> {
        // Run ids are unique per repository; workflow_id only scopes the
        // idempotency key.
        self.invocation()
            .args(["run", "download"])
            .arg(&artifact.run_id.0)
            .arg("--repo")
            .arg(artifact.repository.to_string())
            .arg("--name")
            .arg(&artifact.artifact_name.0)
            .arg("--dir")
            .arg(dest)
            .checked()
            .map_err(|err| PipelineError::ArtifactDownload {
                artifact: artifact.artifact_name.to_string(),
                run_id: artifact.run_id.to_string(),
                reason: err.to_string(),
            })?;
        tracing::info!(
            artifact = %artifact.artifact_name,
            run_id = %artifact.run_id,
            dest = %dest.display(),
            "artifact downloaded"
        );
        Ok(())
    }
}

impl PullRequestFeedback for GhCli {
    fn add_labels(
        &self,
        repository: &RepoSlug,
        pr: PrNumber,
        labels: &[String],
    ) -> Result<(), PipelineError> {
        if labels.is_empty() {
            return Ok(());
        }
        self.invocation()
            .args(["pr", "edit"])
            .arg(pr.to_string())
            .arg("--repo")
            .arg(repository.to_string())
            .arg("--add-label")
            .arg(&labels.join(","))
            .checked()
            .map_err(|e| github_err("pr edit --add-label", e))?;
        Ok(())
    }

    fn comment(
        &self,
        repository: &RepoSlug,
        pr: PrNumber,
        body: &str,
    ) -> Result<(), PipelineError> {
        self.invocation()
            .args(["pr", "comment"])
            .arg(pr.to_string())
            .arg("--repo")
            .arg(repository.to_string())
            .args(["--body-file", "-"])
            .stdin(body.as_bytes())
            .checked()
            .map_err(|e| github_err("pr comment", e))?;
        Ok(())
    }
}

impl EventForwarder for GhCli {
    fn forward(&self, repository: &RepoSlug, event: &OutboundEvent) -> Result<(), PipelineError> {
        let body = serde_json::to_vec(event)?;
        self.invocation()
            .arg("api")
            .arg(format!("repos/{repository}/dispatches"))
            .args(["--method", "POST", "--input", "-"])
            .stdin(&body)
            .checked()
            .map_err(|e| github_err("repository dispatch", e))?;
        Ok(())
    }
}

/// Publishes releases to one repository through `gh release`.
#[derive(Debug, Clone)]
pub struct GhReleaseHost {
    gh: GhCli,
    repository: RepoSlug,
}

impl GhReleaseHost {
    pub fn new(gh: GhCli, repository: RepoSlug) -> Self {
        Self { gh, repository }
    }

    fn create(&self, tag: &str, notes: &str, asset: &Path) -> Result<(), PipelineError> {
        self.gh
            .invocation()
            .args(["release", "create", tag])
            .arg(asset)
            .arg("--repo")
            .arg(self.repository.to_string())
            .arg("--title")
            .arg(format!("Registry {tag}"))
            .args(["--notes-file", "-"])
            .stdin(notes.as_bytes())
            .checked()?;
        Ok(())
    }

    /// `gh release create` refuses an existing tag: swap the asset, then the notes.
    fn replace(&self, tag: &str, notes: &str, asset: &Path) -> Result<(), PipelineError> {
        self.gh
            .invocation()
            .args(["release", "upload", tag])
            .arg(asset)
            .arg("--clobber")
            .arg("--repo")
            .arg(self.repository.to_string())
            .checked()?;
        self.gh
            .invocation()
            .args(["release", "edit", tag])
            .arg("--repo")
            .arg(self.repository.to_string())
            .args(["--notes-file", "-"])
            .stdin(notes.as_bytes())
            .checked()?;
        Ok(())
    }
}

impl ReleaseHost for GhReleaseHost {
    fn publish(
        &self,
        tag: &str,
        notes: &str,
        asset: &Path,
        replace: bool,
    ) -> Result<(), PipelineError> {
        let published = if replace {
            self.replace(tag, notes, asset)
        } else {
            self.create(tag, notes, asset)
        };
        published.map_err(|err| PipelineError::ReleaseHost {
            tag: tag.to_string(),
            reason: err.to_string(),
        })?;
        tracing::info!(tag, repository = %self.repository, replace, "release published");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    use hatch_core::types::EventKind;
    use serde_json::json;

    /// A fake `gh` that appends its argv and stdin to `calls.log`.
    fn fake_gh(dir: &Path, exit: i32) -> GhCli {
        let script = dir.join("gh");
        let log = dir.join("calls.log");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$@\" >> '{log}'\nif [ ! -t 0 ]; then cat >> '{log}'; echo >> '{log}'; fi\nexit {exit}\n",
                log = log.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        GhCli::new(script.to_string_lossy().into_owned())
    }

    fn calls(dir: &Path) -> String {
        std::fs::read_to_string(dir.join("calls.log")).unwrap_or_default()
    }

    fn slug() -> RepoSlug {
        "CrackingShells/Hatching-Dev".parse().unwrap()
    }

    #[test]
    fn labels_are_joined_into_one_call() {
        let dir = TempDir::new().unwrap();
        let gh = fake_gh(dir.path(), 0);
        gh.add_labels(&slug(), PrNumber(42), &["a".into(), "b".into()]).unwrap();
        assert!(calls(dir.path())
            .contains("pr edit 42 --repo CrackingShells/Hatching-Dev --add-label a,b"));
    }

    #[test]
    fn forward_posts_dispatch_body_on_stdin() {
        let dir = TempDir::new().unwrap();
        let gh = fake_gh(dir.path(), 0);
        let event = OutboundEvent {
            event_type: EventKind::ReleasePackage,
            client_payload: json!({ "pr_number": 42 }).as_object().cloned().unwrap(),
        };
        gh.forward(&slug(), &event).unwrap();

        let log = calls(dir.path());
        assert!(log.contains("api repos/CrackingShells/Hatching-Dev/dispatches --method POST --input -"));
        assert!(log.contains(r#"{"event_type":"release-package","client_payload":{"pr_number":42}}"#));
    }

    #[test]
    fn new_release_is_created_with_notes_on_stdin() {
        let dir = TempDir::new().unwrap();
        let host = GhReleaseHost::new(fake_gh(dir.path(), 0), slug());
        let asset = dir.path().join("registry.json");
        host.publish("2025-06-01", "release notes", &asset, false).unwrap();

        let log = calls(dir.path());
        assert!(log.contains("release create 2025-06-01"), "got: {log}");
        assert!(log.contains("--notes-file -"), "got: {log}");
        assert!(log.contains("release notes"), "got: {log}");
        assert!(!log.contains("--clobber"), "got: {log}");
    }

    #[test]
    fn replaced_release_clobbers_asset_and_edits_notes() {
        let dir = TempDir::new().unwrap();
        let host = GhReleaseHost::new(fake_gh(dir.path(), 0), slug());
        let asset = dir.path().join("registry.json");
        host.publish("2025-06-01", "second notes", &asset, true).unwrap();

        let log = calls(dir.path());
        assert!(!log.contains("release create"), "got: {log}");
        assert!(log.contains("release upload 2025-06-01"), "got: {log}");
        assert!(log.contains("--clobber"), "got: {log}");
        assert!(log.contains("release edit 2025-06-01 --repo CrackingShells/Hatching-Dev --notes-file -"), "got: {log}");
        assert!(log.contains("second notes"), "got: {log}");
    }

    #[test]
    fn host_failure_is_release_host_error() {
        let dir = TempDir::new().unwrap();
        let host = GhReleaseHost::new(fake_gh(dir.path(), 1), slug());
        let err = host
            .publish("2025-06-01", "notes", &dir.path().join("registry.json"), true)
            .unwrap_err();
        assert!(matches!(err, PipelineError::ReleaseHost { ref tag, .. } if tag == "2025-06-01"));
    }

    #[test]
    fn failed_download_is_artifact_error() {
        let dir = TempDir::new().unwrap();
        let gh = fake_gh(dir.path(), 1);
        let artifact = ArtifactRef {
            repository: slug(),
            artifact_name: "foo-package".into(),
            workflow_id: "package-validation.yml".into(),
            run_id: "77".into(),
        };
        let err = gh.download(&artifact, dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactDownload { .. }), "got: {err}");
    }
}
