//! Template contexts: serializable rendering payloads for PR feedback and
//! release notes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hatch_core::types::{ValidateRequest, ValidationResult};

use crate::error::RenderError;

/// Payload for the validation success and failure comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackContext {
    pub passed: bool,
    pub package_name: String,
    /// Taken from the payload when present; `validate-package` does not
    /// require it.
    pub version: Option<String>,
    pub pr_number: u64,
    pub repository: String,
    pub artifact_name: String,
    pub workflow_id: String,
    pub run_id: String,
    pub exit_code: Option<i32>,
    pub labels: Vec<String>,
    pub log: String,
    pub log_summary: String,
    /// Code fence long enough to enclose `log` verbatim.
    pub fence: String,
}

impl FeedbackContext {
    pub fn from_validation(
        request: &ValidateRequest,
        result: &ValidationResult,
        labels: &[String],
    ) -> Self {
        let artifact = &request.artifact;
        let log = result.log.trim_end().to_string();
        Self {
            passed: result.passed(),
            package_name: request.package_name.to_string(),
            version: request
                .raw_payload
                .get("version")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            pr_number: request.pr_number.0,
            repository: artifact.repository.to_string(),
            artifact_name: artifact.artifact_name.to_string(),
            workflow_id: artifact.workflow_id.to_string(),
            run_id: artifact.run_id.to_string(),
            exit_code: result.exit_code,
            labels: labels.to_vec(),
            fence: fence_for(&log),
            log_summary: "Validation log".to_string(),
            log,
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
}

/// Payload for release notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseNotesContext {
    pub tag: String,
    pub created_at: String,
    pub digest: String,
    pub forced: bool,
    pub previous_tag: Option<String>,
    /// Unified diff against the previous snapshot; `None` when there is no
    /// previous release or nothing changed.
    pub diff: Option<String>,
    pub diff_stats: DiffStats,
    pub fence: String,
}

impl ReleaseNotesContext {
    pub fn new(
        tag: impl Into<String>,
        created_at: DateTime<Utc>,
        digest: impl Into<String>,
        forced: bool,
        previous_tag: Option<String>,
        diff: Option<String>,
    ) -> Self {
        let diff = diff.filter(|d| !d.trim().is_empty());
        let diff_stats = diff.as_deref().map(count_changes).unwrap_or_default();
        Self {
            tag: tag.into(),
            created_at: created_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            digest: digest.into(),
            forced,
            previous_tag,
            fence: fence_for(diff.as_deref().unwrap_or_default()),
            diff: diff.map(|d| d.trim_end().to_string()),
            diff_stats,
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

/// Backtick fence one longer than the longest run inside `body`, minimum 3.
fn fence_for(body: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in body.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

fn count_changes(diff: &str) -> DiffStats {
    let mut stats = DiffStats::default();
    for line in diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            continue;
        }
        if line.starts_with('+') {
            stats.added += 1;
        } else if line.starts_with('-') {
            stats.removed += 1;
        }
    }
    stats
}
