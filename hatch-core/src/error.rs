//! Error types for hatch-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::EventKind;

/// Errors raised while parsing or validating an inbound dispatch event.
///
/// Every variant is fatal for the run: nothing downstream executes.
#[derive(Debug, Error)]
pub enum EventError {
    /// The event file could not be read.
    #[error("cannot read event file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The event body is not valid JSON, or not the dispatch shape.
    #[error("malformed dispatch event: {0}")]
    Json(#[from] serde_json::Error),

    /// `action` / `event_type` names an event this layer does not know.
    #[error("unknown event type '{0}'; expected one of: validate-package, add-package")]
    UnknownEventType(String),

    /// `release-package` is emitted by this layer, never consumed by it.
    #[error("'{0}' is an outbound event and cannot be received")]
    OutboundOnly(EventKind),

    /// One or more required payload fields are absent or malformed.
    #[error("invalid {kind} payload: {}", describe_payload_problems(.missing, .invalid))]
    InvalidPayload {
        kind: EventKind,
        missing: Vec<String>,
        invalid: Vec<String>,
    },
}

fn describe_payload_problems(missing: &[String], invalid: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing field(s): {}", missing.join(", ")));
    }
    if !invalid.is_empty() {
        parts.push(format!("invalid field(s): {}", invalid.join("; ")));
    }
    parts.join("; ")
}

/// Errors from reading, hashing, or rewriting the registry document.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The registry file is not valid JSON.
    #[error("failed to parse registry at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The registry file did not exist at the expected path.
    #[error("registry not found at {path}")]
    RegistryNotFound { path: PathBuf },
}

/// Errors from loading `config.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error; includes file path and serde_yaml line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`; cannot locate `~/.hatch/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

pub(crate) fn registry_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.into(),
        source,
    }
}
