//! `~/.hatch/config.yaml`: coordination layer settings.
//!
//! Every field has a default, so an absent file is a valid configuration.
//!
//! # API pattern
//!
//! - `load_at(home)`: explicit home; used in tests with `TempDir`
//! - `load()`: derives home from `dirs::home_dir()`, delegates to `load_at`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::RepoSlug;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HatchConfig {
    /// Registry JSON document. Relative paths resolve against the working
    /// directory, which in CI is the registry repository checkout.
    pub registry_path: PathBuf,
    /// Releases, daemon socket, ledger and inbox live here.
    /// Defaults to `<home>/.hatch`.
    pub state_dir: Option<PathBuf>,
    /// Program name or path of the external registry CLI.
    pub registry_cli: String,
    /// Program name or path of the GitHub CLI.
    pub gh_program: String,
    pub labels: LabelConfig,
    pub release: ReleaseConfig,
    /// Directory of `.tera` files overriding the built-in templates.
    pub template_dir: Option<PathBuf>,
}

impl Default for HatchConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("data/hatch_packages_registry.json"),
            state_dir: None,
            registry_cli: "hatch-registry".to_string(),
            gh_program: "gh".to_string(),
            labels: LabelConfig::default(),
            release: ReleaseConfig::default(),
            template_dir: None,
        }
    }
}

impl HatchConfig {
    /// Effective state directory for the given home.
    pub fn state_dir_at(&self, home: &Path) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| home.join(".hatch"))
    }
}

/// PR labels applied by the validation gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelConfig {
    pub success: Vec<String>,
    pub failure: Vec<String>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            success: vec!["validation-passed".into(), "ready-for-review".into()],
            failure: vec!["validation-failed".into()],
        }
    }
}

/// How the publisher decides that the registry changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDetectorKind {
    /// Compare the file digest with the digest of the latest release.
    #[default]
    Digest,
    /// `git diff --quiet <base> <head> -- <registry_path>`.
    Git,
}

/// What to do when a release already exists for today's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    #[default]
    Reject,
    Overwrite,
}

impl std::str::FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(CollisionPolicy::Reject),
            "overwrite" => Ok(CollisionPolicy::Overwrite),
            other => Err(format!(
                "unknown collision policy '{other}'; expected reject or overwrite"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    pub detector: ChangeDetectorKind,
    pub git_base: String,
    pub git_head: String,
    pub collision: CollisionPolicy,
    /// Repository that hosts published releases. `None` keeps releases local.
    pub repository: Option<RepoSlug>,
    /// File name of the registry snapshot inside a release.
    pub asset_name: String,
    /// Seconds between scheduled release checks in the daemon.
    pub interval_secs: u64,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            detector: ChangeDetectorKind::Digest,
            git_base: "HEAD~1".to_string(),
            git_head: "HEAD".to_string(),
            collision: CollisionPolicy::Reject,
            repository: None,
            asset_name: "hatch_packages_registry.json".to_string(),
            interval_secs: 86_400,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// `<home>/.hatch/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".hatch").join("config.yaml")
}

/// Load `<home>/.hatch/config.yaml`, or defaults when it does not exist.
pub fn load_at(home: &Path) -> Result<HatchConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(HatchConfig::default());
    }
    load_from(&path)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<HatchConfig, ConfigError> {
    load_at(&home()?)
}

/// Load an explicit config file. Unlike [`load_at`], a missing file is an error.
pub fn load_from(path: &Path) -> Result<HatchConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Ok(HatchConfig::default());
    }
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
