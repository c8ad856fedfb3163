//! Global flags and the configuration they resolve to.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Args;

use hatch_core::config::{self, HatchConfig};

/// Flags accepted by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Config file (default: ~/.hatch/config.yaml).
    #[arg(long, global = true, env = "HATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// State directory for releases, the daemon socket and the ledger.
    #[arg(long, global = true, env = "HATCH_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Registry JSON file, overriding `registry_path` from the config.
    #[arg(long, global = true, env = "HATCH_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Log line format on stderr: text or json.
    #[arg(long, global = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Effective configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: HatchConfig,
    pub state_dir: PathBuf,
}

impl GlobalArgs {
    pub fn resolve(&self) -> Result<Settings> {
        let mut config = match &self.config {
            Some(path) => config::load_from(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => {
                let home = config::home().context("could not determine home directory")?;
                config::load_at(&home).context("failed to load ~/.hatch/config.yaml")?
            }
        };

        if let Some(registry) = &self.registry {
            config.registry_path = registry.clone();
        }
        if let Some(state_dir) = &self.state_dir {
            config.state_dir = Some(state_dir.clone());
        }

        let state_dir = match &config.state_dir {
            Some(dir) => dir.clone(),
            None => {
                let home = config::home().context("could not determine home directory")?;
                config.state_dir_at(&home)
            }
        };

        tracing::debug!(
            registry = %config.registry_path.display(),
            state_dir = %state_dir.display(),
            "settings resolved"
        );
        Ok(Settings { config, state_dir })
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'; expected: text, json")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Logs go to stderr; stdout is reserved for command output.
pub fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
