//! `hatch-dispatch diff`: registry changes since the last release.

use anyhow::{Context, Result};
use clap::Args;

use hatch_pipeline::Publisher;

use crate::settings::Settings;

/// Arguments for `hatch-dispatch diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {}

impl DiffArgs {
    pub fn run(self, settings: &Settings) -> Result<()> {
        let publisher = Publisher::from_config(&settings.config, &settings.state_dir)
            .context("failed to set up publisher")?;
        let diff = publisher
            .diff_since_last_release()
            .with_context(|| format!("diff failed for {}", publisher.registry_path().display()))?;

        let Some(unified) = diff.unified else {
            match diff.base_tag {
                Some(tag) => println!("No changes since release '{tag}'."),
                None => println!("Registry is empty."),
            }
            return Ok(());
        };

        print!("{unified}");
        if !unified.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
