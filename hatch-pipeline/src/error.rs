//! Error types for hatch-pipeline.

use std::path::PathBuf;

use thiserror::Error;

use hatch_core::error::{EventError, RegistryError};
use hatch_renderer::RenderError;

use crate::gate::GateState;

/// All errors that can arise from pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The inbound event was rejected before anything ran.
    #[error(transparent)]
    Event(#[from] EventError),

    /// An error from the registry document layer.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (release index, outbound bodies).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An external program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external program ran and exited unsuccessfully.
    #[error("{program} {args} exited with {}: {output}", describe_code(.code))]
    CommandFailed {
        program: String,
        args: String,
        code: Option<i32>,
        output: String,
    },

    /// The build artifact could not be fetched. Nothing is reported upstream.
    #[error("failed to download artifact '{artifact}' from run {run_id}: {reason}")]
    ArtifactDownload {
        artifact: String,
        run_id: String,
        reason: String,
    },

    /// Labelling, commenting on, or dispatching to GitHub failed.
    #[error("GitHub {action} failed: {reason}")]
    GitHub { action: String, reason: String },

    /// The gate was asked to move between two states that are not linked.
    #[error("illegal gate transition {from:?} -> {to:?}")]
    IllegalTransition { from: GateState, to: GateState },

    /// The registry CLI rejected the mutation; the registry file was restored.
    #[error("registry mutation for {repository} failed and was rolled back:\n{log}")]
    RegistryMutation { repository: String, log: String },

    /// The registry lock could not be acquired.
    #[error("could not lock {path}: {reason}")]
    Lock { path: PathBuf, reason: String },

    /// Change detection could not decide.
    #[error("change detection failed: {0}")]
    ChangeDetection(String),

    /// A release for this tag already exists and the policy is `reject`.
    #[error("release {tag} already exists; rerun with --on-collision overwrite to replace it")]
    ReleaseExists { tag: String },

    /// The release host refused the release; the index was left untouched.
    #[error("publishing release {tag} failed: {reason}")]
    ReleaseHost { tag: String, reason: String },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Convenience constructor for [`PipelineError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PipelineError {
    PipelineError::Io {
        path: path.into(),
        source,
    }
}
