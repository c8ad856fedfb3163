//! Domain types for the package-release coordination layer.
//!
//! Identifiers taken from a dispatch payload are kept as strings; numeric
//! JSON values are stringified once, at the payload boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A GitHub repository slug, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoSlug {
    owner: String,
    name: String,
}

impl RepoSlug {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name without the owner; this is the name the registry
    /// knows the repository by.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((owner, name)) = s.split_once('/') else {
            return Err(format!("'{s}' is not an owner/name repository slug"));
        };
        let valid = |part: &str| {
            !part.is_empty() && !part.contains('/') && !part.chars().any(char::is_whitespace)
        };
        if !valid(owner) || !valid(name) {
            return Err(format!("'{s}' is not an owner/name repository slug"));
        }
        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl TryFrom<String> for RepoSlug {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RepoSlug> for String {
    fn from(slug: RepoSlug) -> Self {
        slug.to_string()
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Name of a Hatch package.
    PackageName
);
string_newtype!(
    /// Name of a build artifact attached to a workflow run.
    ArtifactName
);
string_newtype!(
    /// Identifier of the workflow run that produced an artifact.
    RunId
);
string_newtype!(
    /// Identifier of the workflow that produced an artifact.
    WorkflowId
);

/// Pull request number on the originating repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrNumber(pub u64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// Cross-repository dispatch event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    ValidatePackage,
    AddPackage,
    ReleasePackage,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ValidatePackage => "validate-package",
            EventKind::AddPackage => "add-package",
            EventKind::ReleasePackage => "release-package",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "validate-package" => Ok(EventKind::ValidatePackage),
            "add-package" => Ok(EventKind::AddPackage),
            "release-package" => Ok(EventKind::ReleasePackage),
            other => Err(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed inbound requests
// ---------------------------------------------------------------------------

/// Payload keys echoed unchanged into the `release-package` event.
pub const RELEASE_PAYLOAD_FIELDS: [&str; 5] =
    ["pr_number", "artifact_name", "package_name", "workflow_id", "run_id"];

/// Identity of the package author, as the registry CLI expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "GitHubID")]
    pub github_id: String,
    pub email: String,
}

/// Locates a build artifact: which repository, which run, which name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub repository: RepoSlug,
    pub artifact_name: ArtifactName,
    pub workflow_id: WorkflowId,
    pub run_id: RunId,
}

/// A validated `validate-package` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub artifact: ArtifactRef,
    pub pr_number: PrNumber,
    pub package_name: PackageName,
    /// The original `client_payload`, kept so forwarded fields are copied
    /// verbatim rather than re-encoded from the typed fields above.
    pub raw_payload: Map<String, Value>,
}

impl ValidateRequest {
    /// Build the `release-package` event emitted after a passing validation.
    pub fn release_event(&self) -> OutboundEvent {
        let client_payload = RELEASE_PAYLOAD_FIELDS
            .iter()
            .filter_map(|key| {
                self.raw_payload
                    .get(*key)
                    .map(|value| ((*key).to_string(), value.clone()))
            })
            .collect();
        OutboundEvent {
            event_type: EventKind::ReleasePackage,
            client_payload,
        }
    }
}

/// A validated `add-package` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPackageRequest {
    pub artifact: ArtifactRef,
    pub pr_number: PrNumber,
    pub package_name: PackageName,
    pub version: String,
    pub author: Author,
}

/// An inbound event whose payload passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundEvent {
    ValidatePackage(ValidateRequest),
    AddPackage(AddPackageRequest),
}

impl InboundEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InboundEvent::ValidatePackage(_) => EventKind::ValidatePackage,
            InboundEvent::AddPackage(_) => EventKind::AddPackage,
        }
    }

    pub fn artifact(&self) -> &ArtifactRef {
        match self {
            InboundEvent::ValidatePackage(req) => &req.artifact,
            InboundEvent::AddPackage(req) => &req.artifact,
        }
    }

    pub fn package_name(&self) -> &PackageName {
        match self {
            InboundEvent::ValidatePackage(req) => &req.package_name,
            InboundEvent::AddPackage(req) => &req.package_name,
        }
    }

    /// `<type>:<workflow_id>:<run_id>`, identifying one dispatch.
    pub fn idempotency_key(&self) -> String {
        let artifact = self.artifact();
        format!(
            "{}:{}:{}",
            self.kind(),
            artifact.workflow_id,
            artifact.run_id
        )
    }
}

/// An event this layer emits to another repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub event_type: EventKind,
    pub client_payload: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationOutcome {
    Success,
    Failure,
}

/// What the external validator reported for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub outcome: ValidationOutcome,
    /// Combined stdout + stderr of the validator.
    pub log: String,
    /// `None` when the process never produced an exit status.
    pub exit_code: Option<i32>,
}

impl ValidationResult {
    pub fn passed(&self) -> bool {
        self.outcome == ValidationOutcome::Success
    }
}

/// Final status of one pipeline run, as seen by upstream automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Succeeded,
    Failed,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repo_slug_parses_owner_and_name() {
        let slug: RepoSlug = "CrackingShells/Hatch-Dev".parse().unwrap();
        assert_eq!(slug.owner(), "CrackingShells");
        assert_eq!(slug.name(), "Hatch-Dev");
        assert_eq!(slug.to_string(), "CrackingShells/Hatch-Dev");
        assert_eq!(slug.url(), "https://github.com/CrackingShells/Hatch-Dev");
    }

    #[test]
    fn repo_slug_rejects_malformed_values() {
        for bad in ["", "no-slash", "/name", "owner/", "a/b/c", "own er/name"] {
            assert!(bad.parse::<RepoSlug>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn event_kind_string_forms_agree() {
        for kind in [
            EventKind::ValidatePackage,
            EventKind::AddPackage,
            EventKind::ReleasePackage,
        ] {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
            let encoded = serde_json::to_value(kind).unwrap();
            assert_eq!(encoded, json!(kind.as_str()));
        }
    }

    #[test]
    fn author_uses_registry_field_names() {
        let author = Author {
            github_id: "octocat".into(),
            email: "octo@example.com".into(),
        };
        let value = serde_json::to_value(&author).unwrap();
        assert_eq!(value["GitHubID"], json!("octocat"));
    }

    #[test]
    fn release_event_copies_raw_values() {
        let raw = json!({
            "pr_number": 42,
            "artifact_name": "foo-pkg",
            "package_name": "foo",
            "workflow_id": "validate.yml",
            "run_id": 987654321u64,
            "repository": "CrackingShells/foo",
        });
        let request = ValidateRequest {
            artifact: ArtifactRef {
                repository: "CrackingShells/foo".parse().unwrap(),
                artifact_name: "foo-pkg".into(),
                workflow_id: "validate.yml".into(),
                run_id: "987654321".into(),
            },
            pr_number: PrNumber(42),
            package_name: "foo".into(),
            raw_payload: raw.as_object().cloned().unwrap(),
        };

        let event = request.release_event();
        assert_eq!(event.event_type, EventKind::ReleasePackage);
        assert_eq!(event.client_payload.len(), 5);
        assert_eq!(event.client_payload["run_id"], json!(987654321u64));
        assert!(!event.client_payload.contains_key("repository"));
    }
}
