//! `hatch-dispatch daemon`: single-writer dispatch daemon lifecycle.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use hatch_daemon::paths::{inbox_dir, socket_path};
use hatch_daemon::{
    reports_failed_run, request_release, request_status, request_stop, request_submit,
    start_blocking, DaemonError,
};

use crate::settings::Settings;

#[derive(Subcommand, Debug)]
pub enum DaemonCommand {
    /// Run the daemon in the foreground (socket, inbox watcher, scheduler).
    Start,
    /// Request graceful daemon shutdown over the Unix socket.
    Stop,
    /// Query daemon runtime status over the Unix socket.
    Status,
    /// Submit a dispatch event file and wait for its outcome. Exits 1 when the
    /// run failed.
    Submit(SubmitArgs),
    /// Ask the daemon to run a release check.
    Release(DaemonReleaseArgs),
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Dispatch event JSON file.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct DaemonReleaseArgs {
    /// Release even if the registry is unchanged.
    #[arg(long)]
    pub force: bool,
}

pub fn run(command: DaemonCommand, settings: &Settings) -> Result<ExitCode> {
    let state_dir = &settings.state_dir;

    match command {
        DaemonCommand::Start => {
            println!(
                "dispatch daemon listening on {} (inbox {})",
                socket_path(state_dir).display(),
                inbox_dir(state_dir).display()
            );
            start_blocking(settings.config.clone(), state_dir).context("daemon exited with error")?;
        }
        DaemonCommand::Stop => match request_stop(state_dir) {
            Ok(()) => println!("daemon stop requested"),
            Err(DaemonError::DaemonNotRunning { .. }) => {
                println!("daemon is not running");
            }
            Err(err) => return Err(err).context("failed to stop daemon"),
        },
        DaemonCommand::Status => match request_status(state_dir) {
            Ok(status) => print_json(&status)?,
            Err(DaemonError::DaemonNotRunning { .. }) => {
                let payload = serde_json::json!({
                    "running": false,
                    "socket": socket_path(state_dir).display().to_string(),
                });
                print_json(&payload)?;
            }
            Err(err) => return Err(err).context("failed to query daemon status"),
        },
        DaemonCommand::Submit(args) => {
            let text = std::fs::read_to_string(&args.file)
                .with_context(|| format!("failed to read {}", args.file.display()))?;
            let event: Value = serde_json::from_str(&text)
                .with_context(|| format!("{} is not valid JSON", args.file.display()))?;
            let outcome = request_submit(state_dir, event).context("daemon submit failed")?;
            print_json(&outcome)?;
            if reports_failed_run(&outcome) {
                return Ok(ExitCode::FAILURE);
            }
        }
        DaemonCommand::Release(args) => {
            let outcome =
                request_release(state_dir, args.force).context("daemon release failed")?;
            print_json(&outcome)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_json(value: &Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to render daemon JSON")?
    );
    Ok(())
}
