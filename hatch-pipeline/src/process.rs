//! Thin wrapper over `std::process::Command` for the external CLIs.
//!
//! Every invocation captures stdout and stderr. [`capture`] never treats a
//! non-zero exit as an error; [`checked`] does.

use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::PipelineError;

/// Captured result of one process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr, separated by a newline when both are present.
    pub fn combined(&self) -> String {
        match (self.stdout.trim_end().is_empty(), self.stderr.trim_end().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }
}

/// One external command, built up before it runs.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    program: &'a str,
    args: Vec<String>,
    stdin: Option<&'a [u8]>,
    current_dir: Option<&'a Path>,
}

impl<'a> Invocation<'a> {
    pub fn new(program: &'a str) -> Self {
        Self {
            program,
            args: Vec::new(),
            stdin: None,
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    pub fn stdin(mut self, bytes: &'a [u8]) -> Self {
        self.stdin = Some(bytes);
        self
    }

    pub fn current_dir(mut self, dir: &'a Path) -> Self {
        self.current_dir = Some(dir);
        self
    }

    /// Space-joined arguments, for error messages and logs.
    pub fn display_args(&self) -> String {
        self.args.join(" ")
    }

    /// Run to completion. Only a failure to start is an error.
    pub fn capture(&self) -> Result<CommandOutput, PipelineError> {
        tracing::debug!(program = self.program, args = %self.display_args(), "running");
        let mut command = Command::new(self.program);
        command
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        if let Some(dir) = self.current_dir {
            command.current_dir(dir);
        }

        let spawn_err = |source| PipelineError::Spawn {
            program: self.program.to_string(),
            source,
        };
        let mut child = command.spawn().map_err(spawn_err)?;
        let pipe = child.stdin.take();

        // stdin is fed from its own thread while this one drains stdout and
        // stderr, so neither side can fill a pipe and stall the other.
        let (output, fed) = std::thread::scope(|scope| {
            let feeder = match (self.stdin, pipe) {
                (Some(bytes), Some(mut pipe)) => Some(scope.spawn(move || pipe.write_all(bytes))),
                _ => None,
            };
            let output = child.wait_with_output();
            let fed = feeder.map(|feeder| {
                feeder
                    .join()
                    .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")))
            });
            (output, fed)
        });
        let output = output.map_err(spawn_err)?;
        match fed {
            // The child exited without reading all of its input; its exit
            // status and output speak for the run.
            Some(Err(err)) if err.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::debug!(program = self.program, "child closed stdin early");
            }
            Some(Err(err)) => return Err(spawn_err(err)),
            _ => {}
        }

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run to completion; a non-zero exit becomes [`PipelineError::CommandFailed`].
    pub fn checked(&self) -> Result<CommandOutput, PipelineError> {
        let output = self.capture()?;
        if !output.success() {
            return Err(PipelineError::CommandFailed {
                program: self.program.to_string(),
                args: self.display_args(),
                code: output.code,
                output: output.combined(),
            });
        }
        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn capture_keeps_non_zero_exit() {
        let out = Invocation::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .capture()
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.combined(), "out\nerr");
    }

    #[test]
    fn checked_reports_command_and_output() {
        let err = Invocation::new("sh")
            .args(["-c", "echo schema error >&2; exit 1"])
            .checked()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exit code 1"), "got: {msg}");
        assert!(msg.contains("schema error"), "got: {msg}");
    }

    #[test]
    fn stdin_is_forwarded() {
        let out = Invocation::new("cat").stdin(b"hello").checked().unwrap();
        assert_eq!(out.stdout, "hello");
    }

    #[test]
    fn unread_stdin_does_not_mask_the_exit_status() {
        let input = vec![b'x'; 1 << 20];
        let err = Invocation::new("sh")
            .args(["-c", "echo rejected >&2; exit 2"])
            .stdin(&input)
            .checked()
            .unwrap_err();
        match err {
            PipelineError::CommandFailed { code, output, .. } => {
                assert_eq!(code, Some(2));
                assert!(output.contains("rejected"), "got: {output}");
            }
            other => panic!("expected CommandFailed, got {other}"),
        }
    }

    #[test]
    fn large_stdin_and_stdout_do_not_deadlock() {
        let input = vec![b'y'; 1 << 20];
        let out = Invocation::new("cat").stdin(&input).checked().unwrap();
        assert_eq!(out.stdout.len(), input.len());
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = Invocation::new("definitely-not-a-real-program-hatch")
            .capture()
            .unwrap_err();
        assert!(matches!(err, PipelineError::Spawn { .. }));
    }
}
