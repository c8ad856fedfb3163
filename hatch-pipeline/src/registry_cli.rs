//! The external registry CLI (`hatch-registry`) as validator and mutator.

use std::path::{Path, PathBuf};

use hatch_core::types::{Author, ValidationOutcome, ValidationResult};

use crate::collaborators::{PackageValidator, RegistryCli};
use crate::error::PipelineError;
use crate::process::{CommandOutput, Invocation};

/// Invokes the registry CLI against one registry file.
///
/// Every command receives `--registry <path>`.
#[derive(Debug, Clone)]
pub struct HatchRegistryCli {
    program: String,
    registry_path: PathBuf,
}

impl HatchRegistryCli {
    pub fn new(program: impl Into<String>, registry_path: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            registry_path: registry_path.into(),
        }
    }

    fn command(&self, subcommand: &'static str) -> Invocation<'_> {
        Invocation::new(&self.program)
            .arg(subcommand)
            .arg("--registry")
            .arg(&self.registry_path)
    }
}

impl PackageValidator for HatchRegistryCli {
    fn validate(&self, repository_name: &str, package_dir: &Path) -> ValidationResult {
        let run = self
            .command("validate-package")
            .arg("--repository-name")
            .arg(repository_name)
            .arg("--package-dir")
            .arg(package_dir)
            .capture();

        match run {
            Ok(output) => {
                let outcome = if output.success() {
                    ValidationOutcome::Success
                } else {
                    ValidationOutcome::Failure
                };
                tracing::info!(
                    repository = repository_name,
                    exit_code = ?output.code,
                    ?outcome,
                    "validator finished"
                );
                ValidationResult {
                    outcome,
                    log: output.combined(),
                    exit_code: output.code,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "validator could not be started");
                ValidationResult {
                    outcome: ValidationOutcome::Failure,
                    log: err.to_string(),
                    exit_code: None,
                }
            }
        }
    }
}

impl RegistryCli for HatchRegistryCli {
    fn add_repository(&self, name: &str, url: &str) -> Result<CommandOutput, PipelineError> {
        self.command("add-repository")
            .arg("--name")
            .arg(name)
            .arg("--url")
            .arg(url)
            .capture()
    }

    fn add_package(
        &self,
        repository_name: &str,
        package_dir: &Path,
        author: &Author,
    ) -> Result<CommandOutput, PipelineError> {
        self.command("add-package")
            .arg("--repository-name")
            .arg(repository_name)
            .arg("--package-dir")
            .arg(package_dir)
            .arg("--author-github-id")
            .arg(&author.github_id)
            .arg("--author-email")
            .arg(&author.email)
            .capture()
    }
}
