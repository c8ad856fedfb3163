//! `hatch-dispatch release`: cut a dated registry release.

use anyhow::{Context, Result};
use clap::Args;

use hatch_core::config::CollisionPolicy;
use hatch_pipeline::{Publisher, ReleaseOutcome, ReleaseSummary};

use crate::commands::receive::short;
use crate::settings::Settings;

/// Arguments for `hatch-dispatch release`.
#[derive(Args, Debug)]
pub struct ReleaseArgs {
    /// Release even if the registry is unchanged.
    #[arg(long)]
    pub force: bool,

    /// Render the release without writing or publishing it.
    #[arg(long)]
    pub dry_run: bool,

    /// What to do when today's tag already exists: reject or overwrite.
    #[arg(long, value_name = "POLICY")]
    pub on_collision: Option<CollisionPolicy>,

    /// Emit the outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ReleaseArgs {
    pub fn run(self, settings: &Settings) -> Result<()> {
        let mut publisher = Publisher::from_config(&settings.config, &settings.state_dir)
            .context("failed to set up publisher")?
            .with_dry_run(self.dry_run);
        if let Some(policy) = self.on_collision {
            publisher = publisher.with_collision(policy);
        }

        let outcome = publisher
            .maybe_release(self.force)
            .with_context(|| format!("release failed for {}", publisher.registry_path().display()))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("failed to serialize outcome")?
            );
            return Ok(());
        }

        match outcome {
            ReleaseOutcome::NoOp { reason, .. } => println!("✓ nothing to release: {reason}"),
            ReleaseOutcome::DryRun(summary) => {
                println!("[dry-run] would release {}", summary.record.tag);
                print!("{}", summary.notes);
                if !summary.notes.ends_with('\n') {
                    println!();
                }
            }
            ReleaseOutcome::Released(summary) => print_released(&summary),
        }
        Ok(())
    }
}

fn print_released(summary: &ReleaseSummary) {
    let verb = if summary.replaced { "replaced" } else { "released" };
    println!(
        "✓ {verb} {} ({})",
        summary.record.tag,
        short(&summary.record.digest)
    );
    if let Some(dir) = &summary.dir {
        println!("  snapshot: {}", dir.display());
    }
    if summary.published {
        println!("  published to release host");
    }
}
