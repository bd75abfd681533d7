// crates/aidd-runner/src/runner.rs
// ============================================================================
// Module: Command Runner
// Description: Runs a stage entrypoint as a subprocess with byte-capped
//   output capture and a wall-clock timeout.
// Purpose: Centralize the truncation/timeout/ENOENT handling every stage
//   invocation needs.
// Dependencies: tokio, thiserror
// ============================================================================

//! ## Overview
//! [`CommandRunner::run`] never panics on a missing executable or a slow
//! child: a missing executable reports exit code 127 (the POSIX convention
//! for "command not found"), and a timeout kills the child and reports
//! `timed_out: true` rather than blocking the dispatcher indefinitely.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncReadExt as _;
use tokio::process::Command;
use tokio::time::error::Elapsed;

/// Exit code reported when the entrypoint executable cannot be found.
pub const EXIT_CODE_NOT_FOUND: i32 = 127;

/// Marker appended to captured output when it is truncated at the byte cap.
const TRUNCATION_MARKER: &str = "\n... [truncated]";

/// A request to run a stage entrypoint.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// The executable to run.
    pub program: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// The working directory the subprocess is launched in.
    pub cwd: PathBuf,
    /// Environment variables the subprocess runs with, replacing its
    /// inherited environment entirely.
    pub env: BTreeMap<String, String>,
    /// Wall-clock timeout for the subprocess.
    pub timeout: Duration,
    /// Maximum number of bytes captured per stream before truncation.
    pub max_output_bytes: usize,
}

/// The outcome of running a [`RunRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// The process exit code, or [`EXIT_CODE_NOT_FOUND`] when the
    /// executable could not be found.
    pub exit_code: i32,
    /// Captured, possibly truncated, standard output.
    pub stdout: String,
    /// Captured, possibly truncated, standard error.
    pub stderr: String,
    /// Whether the process was killed after exceeding its timeout.
    pub timed_out: bool,
}

/// Runs [`RunRequest`]s as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandRunner;

impl CommandRunner {
    /// Builds a new command runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Runs `request`, capturing stdout/stderr up to
    /// `request.max_output_bytes` each and enforcing `request.timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] when the child cannot be spawned for a
    /// reason other than "command not found", or when its output streams
    /// cannot be read.
    pub async fn run(&self, request: &RunRequest) -> Result<RunOutcome, RunnerError> {
        let mut command = Command::new(&request.program);
        command
            .args(&request.args)
            .current_dir(&request.cwd)
            .env_clear()
            .envs(&request.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(RunOutcome {
                    exit_code: EXIT_CODE_NOT_FOUND,
                    stdout: String::new(),
                    stderr: format!("{}: command not found", request.program),
                    timed_out: false,
                });
            }
            Err(err) => return Err(RunnerError::Spawn(request.program.clone(), err)),
        };

        let mut stdout_pipe = child.stdout.take().ok_or(RunnerError::MissingPipe)?;
        let mut stderr_pipe = child.stderr.take().ok_or(RunnerError::MissingPipe)?;

        let max_bytes = request.max_output_bytes;
        let wait = async {
            let mut stdout_buf = Vec::new();
            let mut stderr_buf = Vec::new();
            let (stdout_result, stderr_result, status) = tokio::join!(
                read_capped(&mut stdout_pipe, max_bytes, &mut stdout_buf),
                read_capped(&mut stderr_pipe, max_bytes, &mut stderr_buf),
                child.wait(),
            );
            stdout_result?;
            stderr_result?;
            let status = status.map_err(RunnerError::Wait)?;
            Ok::<_, RunnerError>((stdout_buf, stderr_buf, status.code().unwrap_or(-1)))
        };

        match tokio::time::timeout(request.timeout, wait).await {
            Ok(result) => {
                let (stdout_buf, stderr_buf, exit_code) = result?;
                Ok(RunOutcome {
                    exit_code,
                    stdout: cap_to_string(stdout_buf, max_bytes),
                    stderr: cap_to_string(stderr_buf, max_bytes),
                    timed_out: false,
                })
            }
            Err(Elapsed { .. }) => {
                let _ = child.start_kill();
                Ok(RunOutcome {
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: "entrypoint timed out".to_string(),
                    timed_out: true,
                })
            }
        }
    }
}

/// Reads from `pipe` into `buf`, stopping once `buf.len()` would exceed
/// `max_bytes`.
async fn read_capped(
    pipe: &mut (impl tokio::io::AsyncRead + Unpin),
    max_bytes: usize,
    buf: &mut Vec<u8>,
) -> Result<(), RunnerError> {
    let mut chunk = [0_u8; 8192];
    loop {
        if buf.len() >= max_bytes {
            break;
        }
        let read = pipe.read(&mut chunk).await.map_err(RunnerError::ReadOutput)?;
        if read == 0 {
            break;
        }
        let remaining = max_bytes.saturating_sub(buf.len());
        let take = read.min(remaining);
        buf.extend_from_slice(&chunk[..take]);
    }
    Ok(())
}

/// Converts a captured byte buffer into a UTF-8 string, appending the
/// truncation marker when the buffer reached `max_bytes`.
fn cap_to_string(buf: Vec<u8>, max_bytes: usize) -> String {
    let truncated = buf.len() >= max_bytes;
    let mut text = String::from_utf8_lossy(&buf).into_owned();
    if truncated {
        text.push_str(TRUNCATION_MARKER);
    }
    text
}

/// Failure running a command.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The executable `0` could not be spawned.
    #[error("failed to spawn {0}: {1}")]
    Spawn(String, #[source] io::Error),
    /// The child process's stdout/stderr pipe was unavailable.
    #[error("child process output pipe was unavailable")]
    MissingPipe,
    /// Reading a child process's output stream failed.
    #[error("failed to read child output: {0}")]
    ReadOutput(#[source] io::Error),
    /// Waiting for the child process failed.
    #[error("failed to wait for child process: {0}")]
    Wait(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::CommandRunner;
    use super::EXIT_CODE_NOT_FOUND;
    use super::RunRequest;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn base_request(program: &str, args: &[&str]) -> RunRequest {
        RunRequest {
            program: program.to_string(),
            args: args.iter().map(|s| (*s).to_string()).collect(),
            cwd: std::env::temp_dir(),
            env: BTreeMap::new(),
            timeout: Duration::from_secs(5),
            max_output_bytes: 4096,
        }
    }

    #[tokio::test]
    async fn reports_127_for_missing_executable() {
        let runner = CommandRunner::new();
        let request = base_request("aidd-runner-nonexistent-binary", &[]);
        let outcome = runner.run(&request).await.expect("runs");
        assert_eq!(outcome.exit_code, EXIT_CODE_NOT_FOUND);
    }

    #[tokio::test]
    async fn captures_stdout_from_a_successful_command() {
        let runner = CommandRunner::new();
        let request = base_request("printf", &["hello"]);
        let outcome = runner.run(&request).await.expect("runs");
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout, "hello");
        assert!(!outcome.timed_out);
    }

    #[tokio::test]
    async fn truncates_output_past_the_byte_cap() {
        let runner = CommandRunner::new();
        let mut request = base_request("sh", &["-c", "printf '0123456789'"]);
        request.max_output_bytes = 4;
        let outcome = runner.run(&request).await.expect("runs");
        assert!(outcome.stdout.starts_with("0123"));
        assert!(outcome.stdout.ends_with("[truncated]"));
    }

    #[tokio::test]
    async fn times_out_a_slow_command() {
        let runner = CommandRunner::new();
        let mut request = base_request("sleep", &["5"]);
        request.timeout = Duration::from_millis(50);
        let outcome = runner.run(&request).await.expect("runs");
        assert!(outcome.timed_out);
    }
}
