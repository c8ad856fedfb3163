//! In-memory collaborators shared by the pipeline integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use hatch_core::config::HatchConfig;
use hatch_core::types::{
    ArtifactRef, Author, OutboundEvent, PrNumber, RepoSlug, ValidationOutcome, ValidationResult,
};
use hatch_pipeline::collaborators::{
    ArtifactSource, EventForwarder, PackageValidator, PullRequestFeedback, RegistryCli,
    ReleaseHost,
};
use hatch_pipeline::process::CommandOutput;
use hatch_pipeline::{Collaborators, Dispatcher, PipelineError};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const REGISTRY: &str = r#"{
  "registry_schema_version": "1.1.0",
  "repositories": [
    { "name": "Hatching-Dev", "url": "https://github.com/CrackingShells/Hatching-Dev", "packages": [] }
  ]
}
"#;

/// Every collaborator call, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Download { artifact: String, run_id: String },
    Validate { repository: String },
    Labels { repository: String, pr: u64, labels: Vec<String> },
    Comment { repository: String, pr: u64, body: String },
    Forward { repository: String, event: OutboundEvent },
    AddRepository { name: String, url: String },
    AddPackage { repository: String, author: String },
    Publish { tag: String, replace: bool },
}

/// Knobs for the fake collaborators.
#[derive(Debug, Clone)]
pub struct Behaviour {
    pub download_fails: bool,
    pub validator_exit: i32,
    pub validator_log: String,
    pub add_repository_exit: i32,
    pub add_package_exit: i32,
    pub publish_fails: bool,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            download_fails: false,
            validator_exit: 0,
            validator_log: "package foo is valid".to_string(),
            add_repository_exit: 0,
            add_package_exit: 0,
            publish_fails: false,
        }
    }
}

/// One fake standing in for `gh` and the registry CLI at once.
#[derive(Clone)]
pub struct Fake {
    calls: Arc<Mutex<Vec<Call>>>,
    behaviour: Behaviour,
    registry_path: PathBuf,
}

impl Fake {
    pub fn new(registry_path: &Path, behaviour: Behaviour) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            behaviour,
            registry_path: registry_path.to_path_buf(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn comments(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Comment { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    pub fn forwards(&self) -> Vec<OutboundEvent> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Forward { event, .. } => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Labels { labels, .. } => Some(labels),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Like the real CLI, a missing registry starts out empty.
    fn edit_registry(&self, edit: impl FnOnce(&mut Value)) {
        let text = std::fs::read_to_string(&self.registry_path).unwrap_or_else(|_| {
            r#"{ "registry_schema_version": "1.1.0", "repositories": [] }"#.to_string()
        });
        let mut doc: Value = serde_json::from_str(&text).unwrap();
        edit(&mut doc);
        std::fs::write(&self.registry_path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    }

    fn output(code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

impl ArtifactSource for Fake {
    fn download(&self, artifact: &ArtifactRef, dest: &Path) -> Result<(), PipelineError> {
        self.push(Call::Download {
            artifact: artifact.artifact_name.to_string(),
            run_id: artifact.run_id.to_string(),
        });
        if self.behaviour.download_fails {
            return Err(PipelineError::ArtifactDownload {
                artifact: artifact.artifact_name.to_string(),
                run_id: artifact.run_id.to_string(),
                reason: "artifact expired".to_string(),
            });
        }
        std::fs::write(dest.join("hatch_metadata.json"), "{}").unwrap();
        Ok(())
    }
}

impl PackageValidator for Fake {
    fn validate(&self, repository_name: &str, package_dir: &Path) -> ValidationResult {
        assert!(package_dir.join("hatch_metadata.json").exists(), "artifact not in package dir");
        self.push(Call::Validate {
            repository: repository_name.to_string(),
        });
        ValidationResult {
            outcome: if self.behaviour.validator_exit == 0 {
                ValidationOutcome::Success
            } else {
                ValidationOutcome::Failure
            },
            log: self.behaviour.validator_log.clone(),
            exit_code: Some(self.behaviour.validator_exit),
        }
    }
}

impl PullRequestFeedback for Fake {
    fn add_labels(
        &self,
        repository: &RepoSlug,
        pr: PrNumber,
        labels: &[String],
    ) -> Result<(), PipelineError> {
        self.push(Call::Labels {
            repository: repository.to_string(),
            pr: pr.0,
            labels: labels.to_vec(),
        });
        Ok(())
    }

    fn comment(&self, repository: &RepoSlug, pr: PrNumber, body: &str) -> Result<(), PipelineError> {
        self.push(Call::Comment {
            repository: repository.to_string(),
            pr: pr.0,
            body: body.to_string(),
        });
        Ok(())
    }
}

impl EventForwarder for Fake {
    fn forward(&self, repository: &RepoSlug, event: &OutboundEvent) -> Result<(), PipelineError> {
        self.push(Call::Forward {
            repository: repository.to_string(),
            event: event.clone(),
        });
        Ok(())
    }
}

impl RegistryCli for Fake {
    fn add_repository(&self, name: &str, url: &str) -> Result<CommandOutput, PipelineError> {
        self.push(Call::AddRepository {
            name: name.to_string(),
            url: url.to_string(),
        });
        if self.behaviour.add_repository_exit != 0 {
            return Ok(Self::output(self.behaviour.add_repository_exit, "invalid url"));
        }
        self.edit_registry(|doc| {
            doc["repositories"]
                .as_array_mut()
                .unwrap()
                .push(json!({ "name": name, "url": url, "packages": [] }));
        });
        Ok(Self::output(0, ""))
    }

    fn add_package(
        &self,
        repository_name: &str,
        _package_dir: &Path,
        author: &Author,
    ) -> Result<CommandOutput, PipelineError> {
        self.push(Call::AddPackage {
            repository: repository_name.to_string(),
            author: author.github_id.clone(),
        });
        if self.behaviour.add_package_exit != 0 {
            // Simulate a CLI that dies half-way through a rewrite.
            std::fs::write(&self.registry_path, "{\"repositories\": [").unwrap();
            return Ok(Self::output(
                self.behaviour.add_package_exit,
                "version 1.0.0 is not newer than 1.0.0",
            ));
        }
        let author = author.github_id.clone();
        self.edit_registry(|doc| {
            for repo in doc["repositories"].as_array_mut().unwrap() {
                if repo["name"] == repository_name {
                    repo["packages"]
                        .as_array_mut()
                        .unwrap()
                        .push(json!({ "name": "foo", "author": author }));
                }
            }
        });
        Ok(Self::output(0, ""))
    }
}

impl ReleaseHost for Fake {
    fn publish(
        &self,
        tag: &str,
        _notes: &str,
        asset: &Path,
        replace: bool,
    ) -> Result<(), PipelineError> {
        assert!(asset.exists(), "asset must be written before publishing");
        self.push(Call::Publish {
            tag: tag.to_string(),
            replace,
        });
        if self.behaviour.publish_fails {
            return Err(PipelineError::ReleaseHost {
                tag: tag.to_string(),
                reason: "HTTP 502".to_string(),
            });
        }
        Ok(())
    }
}

/// A temp state dir with a registry file and a matching config.
pub struct World {
    pub dir: TempDir,
    pub config: HatchConfig,
}

impl World {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let registry_path = dir.path().join("data").join("hatch_packages_registry.json");
        std::fs::create_dir_all(registry_path.parent().unwrap()).unwrap();
        std::fs::write(&registry_path, REGISTRY).unwrap();
        let config = HatchConfig {
            registry_path,
            state_dir: Some(dir.path().join("state")),
            ..HatchConfig::default()
        };
        Self { dir, config }
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    pub fn registry_path(&self) -> &Path {
        &self.config.registry_path
    }

    pub fn fake(&self, behaviour: Behaviour) -> Fake {
        Fake::new(self.registry_path(), behaviour)
    }

    pub fn dispatcher(&self, fake: &Fake) -> Dispatcher {
        let shared = Arc::new(fake.clone());
        let collaborators = Collaborators {
            artifacts: shared.clone(),
            validator: shared.clone(),
            feedback: shared.clone(),
            forwarder: shared.clone(),
            registry_cli: shared,
        };
        Dispatcher::with_collaborators(&self.config, &self.state_dir(), collaborators).unwrap()
    }
}

pub fn validate_event(payload: Value) -> hatch_core::DispatchEvent {
    serde_json::from_value(json!({ "action": "validate-package", "client_payload": payload }))
        .unwrap()
}

pub fn add_event(payload: Value) -> hatch_core::DispatchEvent {
    serde_json::from_value(json!({ "action": "add-package", "client_payload": payload })).unwrap()
}

/// The `{package_name: "foo", version: "1.0.0", pr_number: 42}` scenario payload.
pub fn scenario_payload() -> Value {
    json!({
        "repository": "CrackingShells/Hatching-Dev",
        "artifact_name": "foo-package",
        "workflow_id": "package-validation.yml",
        "run_id": 123456789,
        "pr_number": 42,
        "package_name": "foo",
        "version": "1.0.0",
    })
}

pub fn add_payload(repository: &str) -> Value {
    let mut payload = scenario_payload();
    payload["repository"] = json!(repository);
    payload["author"] = json!({ "GitHubID": "octocat", "email": "octocat@example.com" });
    payload
}
