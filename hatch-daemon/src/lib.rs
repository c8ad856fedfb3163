//! Dispatch daemon: a single-writer job queue fed by a Unix socket, an inbox
//! directory and a release scheduler.

mod error;
pub mod ledger;
pub mod paths;
pub mod protocol;
mod runtime;

pub use error::DaemonError;
pub use ledger::{Ledger, LedgerEntry};
pub use protocol::{
    reports_failed_run, request_release, request_status, request_stop, request_submit,
    send_request, DaemonRequest, DaemonResponse,
};
pub use runtime::{run, run_with, start_blocking, Services};
