//! Validation gate: artifact in, PR feedback and forward event out.
//!
//! ```text
//! Pending ──pass──▶ Succeeded   labels + comment + release-package forward
//!    └────fail───▶ Failed      label + comment, nothing forwarded
//! ```
//!
//! Both terminal states are final. There are no retries: a failed artifact
//! download aborts before any feedback is posted.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use hatch_core::config::LabelConfig;
use hatch_core::types::{OutboundEvent, RunStatus, ValidateRequest, ValidationResult};
use hatch_renderer::{FeedbackContext, Renderer};

use crate::collaborators::{ArtifactSource, EventForwarder, PackageValidator, PullRequestFeedback};
use crate::error::PipelineError;
use crate::workdir::WorkDir;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateState {
    Pending,
    Succeeded,
    Failed,
}

impl GateState {
    /// Move to `to`. Only `Pending` has outgoing edges.
    pub fn transition(self, to: GateState) -> Result<GateState, PipelineError> {
        match (self, to) {
            (GateState::Pending, GateState::Succeeded | GateState::Failed) => Ok(to),
            (from, to) => Err(PipelineError::IllegalTransition { from, to }),
        }
    }

    pub fn is_terminal(self) -> bool {
        self != GateState::Pending
    }
}

/// Everything one gate run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateReport {
    pub state: GateState,
    pub result: ValidationResult,
    pub labels: Vec<String>,
    pub comment: String,
    /// The `release-package` event, when one was sent.
    pub forwarded: Option<OutboundEvent>,
}

impl GateReport {
    pub fn status(&self) -> RunStatus {
        match self.state {
            GateState::Succeeded => RunStatus::Succeeded,
            GateState::Pending | GateState::Failed => RunStatus::Failed,
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationGate
// ---------------------------------------------------------------------------

pub struct ValidationGate {
    artifacts: Arc<dyn ArtifactSource>,
    validator: Arc<dyn PackageValidator>,
    feedback: Arc<dyn PullRequestFeedback>,
    forwarder: Arc<dyn EventForwarder>,
    renderer: Arc<Renderer>,
    labels: LabelConfig,
    work_root: PathBuf,
}

impl ValidationGate {
    pub fn new(
        artifacts: Arc<dyn ArtifactSource>,
        validator: Arc<dyn PackageValidator>,
        feedback: Arc<dyn PullRequestFeedback>,
        forwarder: Arc<dyn EventForwarder>,
        renderer: Arc<Renderer>,
        labels: LabelConfig,
        work_root: PathBuf,
    ) -> Self {
        Self {
            artifacts,
            validator,
            feedback,
            forwarder,
            renderer,
            labels,
            work_root,
        }
    }

    /// Run the gate for one `validate-package` request.
    ///
    /// `Err` means the run aborted before reaching a terminal state; a
    /// validator failure is an `Ok` report with `state == Failed`.
    pub fn validate(&self, request: &ValidateRequest) -> Result<GateReport, PipelineError> {
        let state = GateState::Pending;
        let artifact = &request.artifact;
        let repository = &artifact.repository;
        let span = tracing::info_span!(
            "validate",
            package = %request.package_name,
            pr = %request.pr_number,
            run_id = %artifact.run_id,
        );
        let _guard = span.enter();

        let work_dir = WorkDir::for_artifact(&self.work_root, artifact)?;
        self.artifacts.download(artifact, work_dir.path())?;

        let result = self.validator.validate(repository.name(), work_dir.path());
        let labels = if result.passed() {
            self.labels.success.clone()
        } else {
            self.labels.failure.clone()
        };

        let ctx = FeedbackContext::from_validation(request, &result, &labels);
        let comment = self.renderer.render_feedback(&ctx)?;
        self.feedback
            .add_labels(repository, request.pr_number, &labels)?;
        self.feedback
            .comment(repository, request.pr_number, &comment)?;

        let (state, forwarded) = if result.passed() {
            let event = request.release_event();
            self.forwarder.forward(repository, &event)?;
            tracing::info!(repository = %repository, "release-package forwarded");
            (state.transition(GateState::Succeeded)?, Some(event))
        } else {
            tracing::warn!(exit_code = ?result.exit_code, "validation failed");
            (state.transition(GateState::Failed)?, None)
        };

        Ok(GateReport {
            state,
            result,
            labels,
            comment,
            forwarded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_reaches_either_terminal_state() {
        assert_eq!(
            GateState::Pending.transition(GateState::Succeeded).unwrap(),
            GateState::Succeeded
        );
        assert_eq!(
            GateState::Pending.transition(GateState::Failed).unwrap(),
            GateState::Failed
        );
    }

    #[test]
    fn terminal_states_are_final() {
        for from in [GateState::Succeeded, GateState::Failed] {
            assert!(from.is_terminal());
            for to in [GateState::Pending, GateState::Succeeded, GateState::Failed] {
                assert!(matches!(
                    from.transition(to),
                    Err(PipelineError::IllegalTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn pending_cannot_stay_pending() {
        assert!(GateState::Pending.transition(GateState::Pending).is_err());
    }
}
