//! Dispatch receiver: routes validated inbound events to their handler.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use hatch_core::config::HatchConfig;
use hatch_core::event::DispatchEvent;
use hatch_core::types::{InboundEvent, RunStatus};
use hatch_renderer::Renderer;

use crate::collaborators::{
    ArtifactSource, EventForwarder, PackageValidator, PullRequestFeedback, RegistryCli,
};
use crate::error::PipelineError;
use crate::gate::{GateReport, ValidationGate};
use crate::github::GhCli;
use crate::mutation::{MutationReport, RegistryMutator};
use crate::registry_cli::HatchRegistryCli;

/// What one dispatched event produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "handler", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Validated(GateReport),
    Added(MutationReport),
}

impl DispatchOutcome {
    pub fn status(&self) -> RunStatus {
        match self {
            DispatchOutcome::Validated(report) => report.status(),
            DispatchOutcome::Added(_) => RunStatus::Succeeded,
        }
    }
}

/// The external systems a [`Dispatcher`] talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub artifacts: Arc<dyn ArtifactSource>,
    pub validator: Arc<dyn PackageValidator>,
    pub feedback: Arc<dyn PullRequestFeedback>,
    pub forwarder: Arc<dyn EventForwarder>,
    pub registry_cli: Arc<dyn RegistryCli>,
}

impl Collaborators {
    /// `gh` for GitHub, the registry CLI for validation and mutation.
    pub fn from_config(config: &HatchConfig) -> Self {
        let gh = Arc::new(GhCli::new(config.gh_program.clone()));
        let registry = Arc::new(HatchRegistryCli::new(
            config.registry_cli.clone(),
            config.registry_path.clone(),
        ));
        Self {
            artifacts: gh.clone(),
            validator: registry.clone(),
            feedback: gh.clone(),
            forwarder: gh,
            registry_cli: registry,
        }
    }
}

pub struct Dispatcher {
    gate: ValidationGate,
    mutator: RegistryMutator,
}

impl Dispatcher {
    pub fn new(gate: ValidationGate, mutator: RegistryMutator) -> Self {
        Self { gate, mutator }
    }

    /// Wire a dispatcher from explicit collaborators. Artifacts are
    /// downloaded under `<state_dir>/work/`.
    pub fn with_collaborators(
        config: &HatchConfig,
        state_dir: &Path,
        collaborators: Collaborators,
    ) -> Result<Self, PipelineError> {
        let renderer = Arc::new(Renderer::with_template_dir(config.template_dir.as_deref())?);
        let work_root = state_dir.join("work");
        let gate = ValidationGate::new(
            collaborators.artifacts.clone(),
            collaborators.validator,
            collaborators.feedback,
            collaborators.forwarder,
            renderer,
            config.labels.clone(),
            work_root.clone(),
        );
        let mutator = RegistryMutator::new(
            collaborators.artifacts,
            collaborators.registry_cli,
            config.registry_path.clone(),
            work_root,
        );
        Ok(Self::new(gate, mutator))
    }

    pub fn from_config(config: &HatchConfig, state_dir: &Path) -> Result<Self, PipelineError> {
        Self::with_collaborators(config, state_dir, Collaborators::from_config(config))
    }

    /// Validate a raw event, then dispatch it.
    pub fn receive(&self, event: DispatchEvent) -> Result<DispatchOutcome, PipelineError> {
        let inbound = event.into_inbound()?;
        self.dispatch(&inbound)
    }

    pub fn dispatch(&self, event: &InboundEvent) -> Result<DispatchOutcome, PipelineError> {
        tracing::info!(
            kind = %event.kind(),
            key = %event.idempotency_key(),
            package = %event.package_name(),
            "dispatching"
        );
        match event {
            InboundEvent::ValidatePackage(request) => {
                self.gate.validate(request).map(DispatchOutcome::Validated)
            }
            InboundEvent::AddPackage(request) => {
                self.mutator.add_package(request).map(DispatchOutcome::Added)
            }
        }
    }
}
