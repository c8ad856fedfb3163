//! Registry publisher: cuts a dated release when the registry changed.
//!
//! ## `maybe_release` protocol
//!
//! 1. Load the registry (must exist and be valid JSON).
//! 2. Ask the change detector whether it changed since the latest release.
//! 3. Unchanged and not forced → `NoOp`.
//! 4. Tag with today's UTC date; apply the collision policy.
//! 5. Render release notes with a diff against the previous snapshot.
//! 6. Stage the release directory as `.<tag>.tmp/`.
//! 7. Publish from the staged directory to the release host, if configured.
//!    A same-day overwrite replaces the hosted release.
//! 8. Swap the staged directory into `releases/<tag>/`.
//! 9. Upsert the index record and save the index.
//!
//! Dry runs stop after step 5. A publish failure at step 7 discards the
//! staged directory: the published snapshot and the index stay as they were,
//! so the next run sees the registry as still changed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hatch_core::config::{CollisionPolicy, HatchConfig};
use hatch_core::registry::{self, RegistrySnapshot};
use hatch_renderer::{ReleaseNotesContext, Renderer};

use crate::collaborators::ReleaseHost;
use crate::detect::{self, ChangeDetector, DigestDetector};
use crate::diff::unified_diff;
use crate::error::PipelineError;
use crate::github::{GhCli, GhReleaseHost};
use crate::release_store::{self, ReleaseRecord};

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A release that was, or in a dry run would have been, cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseSummary {
    pub record: ReleaseRecord,
    pub notes: String,
    /// Release directory; `None` for dry runs.
    pub dir: Option<PathBuf>,
    pub published: bool,
    /// An existing same-day release was overwritten.
    pub replaced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReleaseOutcome {
    Released(ReleaseSummary),
    DryRun(ReleaseSummary),
    NoOp { reason: String, digest: String },
}

/// Snapshot of where the registry stands relative to its releases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseStatus {
    pub registry_path: PathBuf,
    pub current_digest: String,
    pub latest: Option<ReleaseRecord>,
    pub release_count: usize,
    /// Registry content differs from the latest release.
    pub pending: bool,
}

/// Registry changes since the latest release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDiff {
    pub base_tag: Option<String>,
    /// `None` when the registry matches the latest release.
    pub unified: Option<String>,
}

pub struct Publisher {
    registry_path: PathBuf,
    state_dir: PathBuf,
    asset_name: String,
    collision: CollisionPolicy,
    detector: Box<dyn ChangeDetector>,
    host: Option<Box<dyn ReleaseHost>>,
    renderer: Arc<Renderer>,
    clock: Clock,
    dry_run: bool,
}

impl Publisher {
    /// Digest detector, `reject` collisions, no release host, system clock.
    pub fn new(
        registry_path: PathBuf,
        state_dir: PathBuf,
        asset_name: impl Into<String>,
        renderer: Arc<Renderer>,
    ) -> Self {
        Self {
            registry_path,
            state_dir,
            asset_name: asset_name.into(),
            collision: CollisionPolicy::Reject,
            detector: Box::new(DigestDetector),
            host: None,
            renderer,
            clock: Box::new(Utc::now),
            dry_run: false,
        }
    }

    pub fn from_config(config: &HatchConfig, state_dir: &Path) -> Result<Self, PipelineError> {
        let renderer = Arc::new(Renderer::with_template_dir(config.template_dir.as_deref())?);
        let release = &config.release;
        let mut publisher = Self::new(
            config.registry_path.clone(),
            state_dir.to_path_buf(),
            release.asset_name.clone(),
            renderer,
        )
        .with_collision(release.collision)
        .with_detector(detect::from_config(release));
        if let Some(repository) = &release.repository {
            publisher = publisher.with_host(Box::new(GhReleaseHost::new(
                GhCli::new(config.gh_program.clone()),
                repository.clone(),
            )));
        }
        Ok(publisher)
    }

    pub fn with_collision(mut self, policy: CollisionPolicy) -> Self {
        self.collision = policy;
        self
    }

    pub fn with_detector(mut self, detector: Box<dyn ChangeDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_host(mut self, host: Box<dyn ReleaseHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    /// Cut a release iff the registry changed or `forced` is set.
    pub fn maybe_release(&self, forced: bool) -> Result<ReleaseOutcome, PipelineError> {
        let current = registry::load_at(&self.registry_path)?;
        let mut index = release_store::load_at(&self.state_dir)?;

        let changed = self.detector.has_changed(&current, index.latest())?;
        if !changed && !forced {
            let reason = match index.latest() {
                Some(latest) => format!("registry unchanged since release {}", latest.tag),
                None => "registry unchanged".to_string(),
            };
            tracing::info!(digest = %current.digest, %reason, "no release needed");
            return Ok(ReleaseOutcome::NoOp {
                reason,
                digest: current.digest,
            });
        }

        let now = (self.clock)();
        let tag = now.format("%Y-%m-%d").to_string();
        let replaced = index.find(&tag).is_some();
        if replaced && self.collision == CollisionPolicy::Reject {
            return Err(PipelineError::ReleaseExists { tag });
        }

        let previous = index.previous_to(&tag).cloned();
        let diff = match &previous {
            Some(prev) => self.diff_against(prev, &current)?,
            None => None,
        };
        let record = ReleaseRecord {
            tag: tag.clone(),
            created_at: now,
            digest: current.digest.clone(),
            forced,
            previous_tag: previous.map(|p| p.tag),
        };
        let ctx = ReleaseNotesContext::new(
            &tag,
            now,
            &record.digest,
            forced,
            record.previous_tag.clone(),
            diff,
        );
        let notes = self.renderer.render_release_notes(&ctx)?;

        if self.dry_run {
            tracing::info!(%tag, changed, forced, "[dry-run] would release");
            return Ok(ReleaseOutcome::DryRun(ReleaseSummary {
                record,
                notes,
                dir: None,
                published: false,
                replaced,
            }));
        }

        let staging = release_store::stage_release_at(
            &self.state_dir,
            &record,
            &self.asset_name,
            &current.bytes,
            &notes,
        )?;

        let published = match &self.host {
            Some(host) => {
                let asset = staging.join(&self.asset_name);
                if let Err(err) = host.publish(&tag, &notes, &asset, replaced) {
                    release_store::discard_staged(&staging);
                    return Err(err);
                }
                true
            }
            None => false,
        };

        let dir = release_store::commit_release_at(&self.state_dir, &tag, &staging)?;
        index.upsert(record.clone());
        release_store::save_at(&self.state_dir, &index)?;
        tracing::info!(%tag, digest = %record.digest, forced, published, replaced, "release cut");

        Ok(ReleaseOutcome::Released(ReleaseSummary {
            record,
            notes,
            dir: Some(dir),
            published,
            replaced,
        }))
    }

    pub fn status(&self) -> Result<ReleaseStatus, PipelineError> {
        let current = registry::load_at(&self.registry_path)?;
        let index = release_store::load_at(&self.state_dir)?;
        let latest = index.latest().cloned();
        let pending = DigestDetector.has_changed(&current, latest.as_ref())?;
        Ok(ReleaseStatus {
            registry_path: self.registry_path.clone(),
            current_digest: current.digest,
            latest,
            release_count: index.releases.len(),
            pending,
        })
    }

    pub fn diff_since_last_release(&self) -> Result<RegistryDiff, PipelineError> {
        let current = registry::load_at(&self.registry_path)?;
        let index = release_store::load_at(&self.state_dir)?;
        match index.latest() {
            Some(latest) => Ok(RegistryDiff {
                base_tag: Some(latest.tag.clone()),
                unified: self.diff_against(latest, &current)?,
            }),
            None => Ok(RegistryDiff {
                base_tag: None,
                unified: unified_diff("", &current.pretty()?, "(no release)", &self.current_label()),
            }),
        }
    }

    fn diff_against(
        &self,
        release: &ReleaseRecord,
        current: &RegistrySnapshot,
    ) -> Result<Option<String>, PipelineError> {
        let bytes = release_store::load_snapshot_at(&self.state_dir, &release.tag, &self.asset_name)?;
        let old = RegistrySnapshot::from_bytes(
            release_store::release_dir_at(&self.state_dir, &release.tag).join(&self.asset_name),
            bytes,
        )?;
        Ok(unified_diff(
            &old.pretty()?,
            &current.pretty()?,
            &release.tag,
            &self.current_label(),
        ))
    }

    fn current_label(&self) -> String {
        self.registry_path.display().to_string()
    }
}
