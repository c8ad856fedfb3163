//! Dispatch event parsing and payload validation.
//!
//! The wire shape is GitHub's `repository_dispatch` event:
//!
//! ```text
//! { "action": "validate-package", "client_payload": { ... }, ...ignored }
//! ```
//!
//! `event_type` is accepted in place of `action` so the body sent to the
//! dispatches endpoint can be replayed as-is.
//!
//! Validation collects every problem before failing, so one rejected run
//! names all missing fields at once.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EventError;
use crate::types::{
    AddPackageRequest, ArtifactRef, Author, EventKind, InboundEvent, PrNumber, RepoSlug,
    ValidateRequest,
};

/// A dispatch event exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchEvent {
    #[serde(alias = "event_type")]
    pub action: String,
    #[serde(default)]
    pub client_payload: Map<String, Value>,
}

impl DispatchEvent {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EventError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, EventError> {
        let bytes = std::fs::read(path).map_err(|source| EventError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes)
    }

    pub fn kind(&self) -> Result<EventKind, EventError> {
        self.action
            .parse::<EventKind>()
            .map_err(EventError::UnknownEventType)
    }

    /// Validate the payload and produce a typed inbound event.
    pub fn into_inbound(self) -> Result<InboundEvent, EventError> {
        match self.kind()? {
            EventKind::ValidatePackage => {
                validate_request(self.client_payload).map(InboundEvent::ValidatePackage)
            }
            EventKind::AddPackage => {
                add_package_request(self.client_payload).map(InboundEvent::AddPackage)
            }
            kind @ EventKind::ReleasePackage => Err(EventError::OutboundOnly(kind)),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed request builders
// ---------------------------------------------------------------------------

fn validate_request(payload: Map<String, Value>) -> Result<ValidateRequest, EventError> {
    let mut reader = PayloadReader::new(&payload);
    let artifact = reader.artifact();
    let pr_number = reader.pr_number("pr_number");
    let package_name = reader.string("package_name");
    reader.finish(EventKind::ValidatePackage)?;

    match (artifact, pr_number, package_name) {
        (Some(artifact), Some(pr_number), Some(package_name)) => Ok(ValidateRequest {
            artifact,
            pr_number,
            package_name: package_name.into(),
            raw_payload: payload,
        }),
        _ => Err(incomplete(EventKind::ValidatePackage)),
    }
}

fn add_package_request(payload: Map<String, Value>) -> Result<AddPackageRequest, EventError> {
    let mut reader = PayloadReader::new(&payload);
    let artifact = reader.artifact();
    let pr_number = reader.pr_number("pr_number");
    let package_name = reader.string("package_name");
    let version = reader.string("version");
    let github_id = reader.nested_string("author", "GitHubID");
    let email = reader.nested_string("author", "email");
    reader.finish(EventKind::AddPackage)?;

    match (artifact, pr_number, package_name, version, github_id, email) {
        (
            Some(artifact),
            Some(pr_number),
            Some(package_name),
            Some(version),
            Some(github_id),
            Some(email),
        ) => Ok(AddPackageRequest {
            artifact,
            pr_number,
            package_name: package_name.into(),
            version,
            author: Author { github_id, email },
        }),
        _ => Err(incomplete(EventKind::AddPackage)),
    }
}

/// Reached only if a reader accessor returned `None` without recording why.
fn incomplete(kind: EventKind) -> EventError {
    EventError::InvalidPayload {
        kind,
        missing: vec![],
        invalid: vec!["payload incomplete".to_string()],
    }
}

// ---------------------------------------------------------------------------
// PayloadReader
// ---------------------------------------------------------------------------

/// Field accessor that records every missing or malformed key.
struct PayloadReader<'a> {
    payload: &'a Map<String, Value>,
    missing: Vec<String>,
    invalid: Vec<String>,
}

impl<'a> PayloadReader<'a> {
    fn new(payload: &'a Map<String, Value>) -> Self {
        Self {
            payload,
            missing: Vec::new(),
            invalid: Vec::new(),
        }
    }

    fn artifact(&mut self) -> Option<ArtifactRef> {
        let repository = self.repository("repository");
        let artifact_name = self.string("artifact_name");
        let workflow_id = self.identifier("workflow_id");
        let run_id = self.identifier("run_id");
        Some(ArtifactRef {
            repository: repository?,
            artifact_name: artifact_name?.into(),
            workflow_id: workflow_id?.into(),
            run_id: run_id?.into(),
        })
    }

    fn present(&mut self, key: &str, value: Option<&'a Value>) -> Option<&'a Value> {
        match value {
            None | Some(Value::Null) => {
                self.missing.push(key.to_string());
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, key: &str) -> Option<String> {
        let value = self.payload.get(key);
        let value = self.present(key, value)?;
        self.non_empty_string(key, value)
    }

    fn nested_string(&mut self, parent: &str, key: &str) -> Option<String> {
        let path = format!("{parent}.{key}");
        let value = match self.payload.get(parent) {
            Some(Value::Object(inner)) => inner.get(key),
            Some(Value::Null) | None => None,
            Some(_) => {
                self.invalid.push(format!("{parent}: must be an object"));
                return None;
            }
        };
        let value = self.present(&path, value)?;
        self.non_empty_string(&path, value)
    }

    fn non_empty_string(&mut self, key: &str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::String(_) => {
                self.missing.push(key.to_string());
                None
            }
            _ => {
                self.invalid.push(format!("{key}: must be a string"));
                None
            }
        }
    }

    /// Run and workflow identifiers arrive as strings or integers.
    fn identifier(&mut self, key: &str) -> Option<String> {
        let value = self.payload.get(key);
        match self.present(key, value)? {
            Value::Number(n) if n.is_u64() => Some(n.to_string()),
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::String(_) => {
                self.missing.push(key.to_string());
                None
            }
            _ => {
                self.invalid
                    .push(format!("{key}: must be a string or non-negative integer"));
                None
            }
        }
    }

    fn pr_number(&mut self, key: &str) -> Option<PrNumber> {
        let value = self.payload.get(key);
        let parsed = match self.present(key, value)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) if s.trim().is_empty() => {
                self.missing.push(key.to_string());
                return None;
            }
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if n > 0 => Some(PrNumber(n)),
            _ => {
                self.invalid
                    .push(format!("{key}: must be a positive integer"));
                None
            }
        }
    }

    fn repository(&mut self, key: &str) -> Option<RepoSlug> {
        let raw = self.string(key)?;
        match raw.parse::<RepoSlug>() {
            Ok(slug) => Some(slug),
            Err(reason) => {
                self.invalid.push(format!("{key}: {reason}"));
                None
            }
        }
    }

    fn finish(self, kind: EventKind) -> Result<(), EventError> {
        if self.missing.is_empty() && self.invalid.is_empty() {
            return Ok(());
        }
        Err(EventError::InvalidPayload {
            kind,
            missing: self.missing,
            invalid: self.invalid,
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
