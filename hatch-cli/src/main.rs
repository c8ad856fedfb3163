//! Hatch dispatch: package validation gate and registry release publisher.
//!
//! # Usage
//!
//! ```text
//! hatch-dispatch receive [--event <path>] [--json]
//! hatch-dispatch check [--event <path>] [--json]
//! hatch-dispatch release [--force] [--dry-run] [--on-collision reject|overwrite]
//! hatch-dispatch status [--json]
//! hatch-dispatch diff
//! hatch-dispatch daemon start|stop|status|submit <file>|release [--force]
//! ```
//!
//! Global flags: `--config`, `--state-dir`, `--registry`, `--log-format`.

mod commands;
mod settings;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    check::CheckArgs, daemon::DaemonCommand, diff::DiffArgs, receive::ReceiveArgs,
    release::ReleaseArgs, status::StatusArgs,
};
use settings::GlobalArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "hatch-dispatch",
    version,
    about = "Validate Hatch package submissions and publish registry releases",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Receive a dispatch event and run its handler.
    Receive(ReceiveArgs),

    /// Validate a dispatch event payload without running anything.
    Check(CheckArgs),

    /// Cut a dated registry release if the registry changed.
    Release(ReleaseArgs),

    /// Show where the registry stands relative to its releases.
    Status(StatusArgs),

    /// Show the unified diff of the registry since the last release.
    Diff(DiffArgs),

    /// Run or talk to the dispatch daemon.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    settings::init_tracing(cli.global.log_format);
    let settings = cli.global.resolve()?;

    let done = |result: Result<()>| result.map(|()| ExitCode::SUCCESS);
    match cli.command {
        Commands::Receive(args) => args.run(&settings),
        Commands::Check(args) => done(args.run()),
        Commands::Release(args) => done(args.run(&settings)),
        Commands::Status(args) => done(args.run(&settings)),
        Commands::Diff(args) => done(args.run(&settings)),
        Commands::Daemon { command } => commands::daemon::run(command, &settings),
    }
}
