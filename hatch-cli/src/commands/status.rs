//! `hatch-dispatch status`: registry release visibility.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use hatch_pipeline::release_store::{self, ReleaseRecord};
use hatch_pipeline::{Publisher, ReleaseStatus};

use crate::commands::receive::short;
use crate::settings::Settings;

/// Arguments for `hatch-dispatch status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, settings: &Settings) -> Result<()> {
        let publisher = Publisher::from_config(&settings.config, &settings.state_dir)
            .context("failed to set up publisher")?;
        let status = publisher
            .status()
            .with_context(|| format!("status failed for {}", publisher.registry_path().display()))?;
        let index = release_store::load_at(&settings.state_dir)
            .context("failed to load release index")?;

        if self.json {
            let payload = StatusJson {
                status: &status,
                releases: &index.releases,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(&status, &index.releases);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusJson<'a> {
    #[serde(flatten)]
    status: &'a ReleaseStatus,
    releases: &'a [ReleaseRecord],
}

#[derive(Tabled)]
struct ReleaseTableRow {
    #[tabled(rename = "tag")]
    tag: String,
    #[tabled(rename = "created")]
    created: String,
    #[tabled(rename = "age")]
    age: String,
    #[tabled(rename = "digest")]
    digest: String,
    #[tabled(rename = "forced")]
    forced: String,
    #[tabled(rename = "previous")]
    previous: String,
}

fn print_table(status: &ReleaseStatus, releases: &[ReleaseRecord]) {
    let state = if status.pending {
        "PENDING".yellow().bold().to_string()
    } else {
        "RELEASED".green().bold().to_string()
    };
    println!(
        "Hatch dispatch v{} | {} releases | {}",
        env!("CARGO_PKG_VERSION"),
        status.release_count,
        state,
    );
    println!(
        "registry: {} ({})",
        status.registry_path.display(),
        short(&status.current_digest)
    );

    if releases.is_empty() {
        println!("No releases yet.");
    } else {
        let now = Utc::now();
        let rows: Vec<ReleaseTableRow> = releases
            .iter()
            .rev()
            .map(|record| ReleaseTableRow {
                tag: record.tag.clone(),
                created: record.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
                age: format_age(record.created_at, now),
                digest: short(&record.digest).to_string(),
                forced: if record.forced { "yes" } else { "" }.to_string(),
                previous: record.previous_tag.clone().unwrap_or_default(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    if status.pending {
        println!("Run 'hatch-dispatch release' to publish pending registry changes.");
    }
}

fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds().max(0);
    match secs {
        0..=59 => "just now".to_string(),
        60..=3_599 => format!("{}m ago", secs / 60),
        3_600..=86_399 => format!("{}h ago", secs / 3_600),
        _ => format!("{}d ago", secs / 86_400),
    }
}
