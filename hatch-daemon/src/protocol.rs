use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use hatch_core::types::RunStatus;

use crate::error::{io_err, DaemonError};
use crate::paths::socket_path;

/// JSON newline-delimited request.
///
/// `cmd` is one of `submit`, `status`, `stop`, `release`. `event` carries
/// the raw dispatch event for `submit`; `force` applies to `release`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonRequest {
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

impl DaemonRequest {
    pub fn command(cmd: &str) -> Self {
        Self {
            cmd: cmd.to_string(),
            ..Self::default()
        }
    }
}

/// JSON newline-delimited response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DaemonResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Send one JSON request to the daemon socket and return one response.
pub fn send_request(
    state_dir: &Path,
    request: &DaemonRequest,
) -> Result<DaemonResponse, DaemonError> {
    let socket = socket_path(state_dir);
    if !socket.exists() {
        return Err(DaemonError::DaemonNotRunning { socket });
    }

    let mut stream = UnixStream::connect(&socket).map_err(|err| {
        if matches!(
            err.kind(),
            std::io::ErrorKind::NotFound
                | std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::ConnectionReset
        ) {
            DaemonError::DaemonNotRunning {
                socket: socket.clone(),
            }
        } else {
            io_err(&socket, err)
        }
    })?;

    let payload = serde_json::to_string(request)?;
    stream
        .write_all(payload.as_bytes())
        .map_err(|e| io_err(&socket, e))?;
    stream.write_all(b"\n").map_err(|e| io_err(&socket, e))?;
    stream.flush().map_err(|e| io_err(&socket, e))?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .map_err(|e| io_err(&socket, e))?;
    if read == 0 {
        return Err(DaemonError::Protocol(
            "daemon closed connection before responding".to_string(),
        ));
    }

    let response: DaemonResponse = serde_json::from_str(line.trim_end())?;
    Ok(response)
}

/// Daemon status. Retries briefly so a just-started daemon has time to bind.
pub fn request_status(state_dir: &Path) -> Result<Value, DaemonError> {
    let request = DaemonRequest::command("status");

    let mut last_not_running: Option<DaemonError> = None;
    for attempt in 0..5 {
        match send_request(state_dir, &request) {
            Ok(response) => return response_into_data(response),
            Err(err @ DaemonError::DaemonNotRunning { .. }) => {
                last_not_running = Some(err);
                if attempt < 4 {
                    sleep(Duration::from_millis(100));
                    continue;
                }
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_not_running.unwrap_or_else(|| {
        DaemonError::Protocol("daemon status retry loop exited unexpectedly".to_string())
    }))
}

pub fn request_stop(state_dir: &Path) -> Result<(), DaemonError> {
    let response = send_request(state_dir, &DaemonRequest::command("stop"))?;
    response_into_data(response).map(|_| ())
}

/// Queue a raw dispatch event and wait for its outcome.
pub fn request_submit(state_dir: &Path, event: Value) -> Result<Value, DaemonError> {
    let request = DaemonRequest {
        event: Some(event),
        ..DaemonRequest::command("submit")
    };
    response_into_data(send_request(state_dir, &request)?)
}

pub fn request_release(state_dir: &Path, force: bool) -> Result<Value, DaemonError> {
    let request = DaemonRequest {
        force: Some(force),
        ..DaemonRequest::command("release")
    };
    response_into_data(send_request(state_dir, &request)?)
}

/// A submit reply for a run that upstream must not treat as a success.
pub fn reports_failed_run(data: &Value) -> bool {
    data.get("status") == Some(&json!(RunStatus::Failed))
}

fn response_into_data(response: DaemonResponse) -> Result<Value, DaemonError> {
    if response.ok {
        Ok(response.data.unwrap_or(Value::Null))
    } else {
        Err(DaemonError::Protocol(
            response
                .error
                .unwrap_or_else(|| "unknown daemon error".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn requests_omit_unused_fields() {
        let encoded = serde_json::to_string(&DaemonRequest::command("status")).unwrap();
        assert_eq!(encoded, r#"{"cmd":"status"}"#);
    }

    #[test]
    fn bare_request_decodes_with_defaults() {
        let request: DaemonRequest = serde_json::from_str(r#"{"cmd":"release"}"#).unwrap();
        assert_eq!(request.cmd, "release");
        assert!(request.force.is_none());
        assert!(request.event.is_none());
    }

    #[test]
    fn missing_socket_is_not_running() {
        let state = TempDir::new().unwrap();
        let err = request_submit(state.path(), json!({})).unwrap_err();
        assert!(matches!(err, DaemonError::DaemonNotRunning { .. }), "got: {err}");
    }

    #[test]
    fn failed_status_is_reported_even_for_duplicates() {
        assert!(reports_failed_run(&json!({ "duplicate": false, "status": "failed" })));
        assert!(reports_failed_run(&json!({ "duplicate": true, "status": "failed" })));
        assert!(!reports_failed_run(&json!({ "status": "succeeded" })));
        assert!(!reports_failed_run(&json!({ "outcome": "released" })));
    }

    #[test]
    fn error_response_becomes_protocol_error() {
        let err = response_into_data(DaemonResponse::error("boom")).unwrap_err();
        assert_eq!(err.to_string(), "daemon protocol error: boom");
    }
}
