use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

pub const DAEMON_SOCKET: &str = "dispatch.sock";
pub const LEDGER_FILE: &str = "ledger.json";

pub fn socket_path(state_dir: &Path) -> PathBuf {
    state_dir.join(DAEMON_SOCKET)
}

pub fn inbox_dir(state_dir: &Path) -> PathBuf {
    state_dir.join("inbox")
}

pub fn processed_dir(state_dir: &Path) -> PathBuf {
    inbox_dir(state_dir).join("processed")
}

pub fn failed_dir(state_dir: &Path) -> PathBuf {
    inbox_dir(state_dir).join("failed")
}

pub fn dispatch_dir(state_dir: &Path) -> PathBuf {
    state_dir.join("dispatch")
}

pub fn ledger_path(state_dir: &Path) -> PathBuf {
    dispatch_dir(state_dir).join(LEDGER_FILE)
}
