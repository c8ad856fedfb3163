//! `hatch-dispatch receive`: run the handler for one dispatch event.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use hatch_core::event::DispatchEvent;
use hatch_core::types::RunStatus;
use hatch_pipeline::{DispatchOutcome, Dispatcher, GateReport, MutationReport};

use crate::settings::Settings;

/// Arguments for `hatch-dispatch receive`.
#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// Dispatch event JSON file.
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event: PathBuf,

    /// Emit the outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ReceiveArgs {
    /// Exit code 1 when the run is marked failed.
    pub fn run(self, settings: &Settings) -> Result<ExitCode> {
        let event = DispatchEvent::from_path(&self.event)
            .with_context(|| format!("failed to read dispatch event {}", self.event.display()))?;
        let dispatcher = Dispatcher::from_config(&settings.config, &settings.state_dir)
            .context("failed to set up dispatcher")?;
        let outcome = dispatcher.receive(event).context("dispatch failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("failed to serialize outcome")?
            );
        } else {
            match &outcome {
                DispatchOutcome::Validated(report) => print_gate(report),
                DispatchOutcome::Added(report) => print_mutation(report),
            }
        }

        Ok(match outcome.status() {
            RunStatus::Succeeded => ExitCode::SUCCESS,
            RunStatus::Failed => ExitCode::FAILURE,
        })
    }
}

fn print_gate(report: &GateReport) {
    if report.result.passed() {
        println!("✓ validation passed");
    } else {
        let code = report
            .result
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string());
        println!("✗ validation failed (exit code {code})");
    }
    println!("  labels: {}", report.labels.join(", "));
    if let Some(event) = &report.forwarded {
        println!("  forwarded: {}", event.event_type);
    }
}

fn print_mutation(report: &MutationReport) {
    println!(
        "✓ added '{}' {} to '{}'",
        report.package_name, report.version, report.repository
    );
    if report.repository_added {
        println!("  registered repository '{}'", report.repository);
    }
    println!(
        "  digest: {} → {}",
        report.digest_before.as_deref().map(short).unwrap_or("(new registry)"),
        short(&report.digest_after)
    );
}

pub(crate) fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
