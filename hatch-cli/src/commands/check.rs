//! `hatch-dispatch check`: validate a dispatch payload without side effects.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hatch_core::event::DispatchEvent;

/// Arguments for `hatch-dispatch check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Dispatch event JSON file.
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event: PathBuf,

    /// Emit the typed event as JSON.
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let event = DispatchEvent::from_path(&self.event)
            .with_context(|| format!("failed to read dispatch event {}", self.event.display()))?;
        let inbound = event.into_inbound().context("invalid dispatch event")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&inbound).context("failed to serialize event")?
            );
            return Ok(());
        }

        let artifact = inbound.artifact();
        println!("✓ valid {} event for '{}'", inbound.kind(), inbound.package_name());
        println!("  repository: {}", artifact.repository);
        println!("  artifact:   {}", artifact.artifact_name);
        println!("  run:        {} / {}", artifact.workflow_id, artifact.run_id);
        println!("  key:        {}", inbound.idempotency_key());
        Ok(())
    }
}
