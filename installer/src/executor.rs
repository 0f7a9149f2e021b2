//! External command execution.
//!
//! Archive tools and the installed binary are run through
//! [`CommandExecutor`] so that extraction routing and launcher behaviour can
//! be tested without spawning real processes.

use crate::error::{InstallerError, Result};
use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::process::{Command, ExitStatus, Output, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default upper bound for captured commands (5 minutes).
const COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the
    /// command, including a timeout.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use openpilot_installer::executor::{CommandExecutor, SystemCommandExecutor};
    /// use std::ffi::{OsStr, OsString};
    ///
    /// let executor = SystemCommandExecutor::default();
    /// let output = executor.run(OsStr::new("tar"), &[OsString::from("--version")])?;
    /// assert!(output.status.success());
    /// # Ok::<(), openpilot_installer::error::InstallerError>(())
    /// ```
    fn run(&self, program: &OsStr, args: &[OsString]) -> Result<Output>;

    /// Runs a command with the three standard streams inherited from this
    /// process and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the command cannot be spawned or awaited.
    fn run_inherited(&self, program: &OsStr, args: &[OsString]) -> Result<ExitStatus>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy)]
pub struct SystemCommandExecutor {
    timeout: Duration,
}

impl SystemCommandExecutor {
    /// Executor whose captured commands are killed after `timeout`.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::with_timeout(COMMAND_TIMEOUT)
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, program: &OsStr, args: &[OsString]) -> Result<Output> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes while waiting so chatty tools cannot block on a
        // full pipe buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let Some(status) = child.wait_timeout(self.timeout)? else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(InstallerError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!(
                    "{} timed out after {} seconds",
                    program.to_string_lossy(),
                    self.timeout.as_secs()
                ),
            )));
        };

        Ok(Output {
            status,
            stdout: collect(stdout)?,
            stderr: collect(stderr)?,
        })
    }

    fn run_inherited(&self, program: &OsStr, args: &[OsString]) -> Result<ExitStatus> {
        Command::new(program)
            .args(args)
            .status()
            .map_err(InstallerError::from)
    }
}

fn drain<R>(stream: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut stream) = stream {
            stream.read_to_end(&mut buffer)?;
        }
        Ok(buffer)
    })
}

fn collect(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>> {
    let bytes = handle
        .join()
        .map_err(|_| std::io::Error::other("output reader thread panicked"))??;
    Ok(bytes)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<OsString> {
        vec![OsString::from("-c"), OsString::from(script)]
    }

    #[test]
    fn run_captures_streams_and_status() {
        let executor = SystemCommandExecutor::default();
        let output = executor
            .run(OsStr::new("sh"), &sh("echo out; echo err >&2; exit 3"))
            .expect("sh runs");
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stdout, b"out\n");
        assert_eq!(output.stderr, b"err\n");
    }

    #[test]
    fn run_survives_output_larger_than_a_pipe_buffer() {
        let executor = SystemCommandExecutor::default();
        let output = executor
            .run(OsStr::new("sh"), &sh("head -c 262144 /dev/zero"))
            .expect("sh runs");
        assert!(output.status.success());
        assert_eq!(output.stdout.len(), 262_144);
    }

    #[test]
    fn run_times_out_long_commands() {
        let executor = SystemCommandExecutor::with_timeout(Duration::from_millis(200));
        let err = executor
            .run(OsStr::new("sh"), &sh("sleep 5"))
            .expect_err("command times out");
        match err {
            InstallerError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::TimedOut),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn run_reports_missing_programs() {
        let executor = SystemCommandExecutor::default();
        let err = executor
            .run(OsStr::new("openpilot-no-such-tool"), &[])
            .expect_err("spawn fails");
        assert!(matches!(err, InstallerError::Io(_)));
    }

    #[test]
    fn run_inherited_returns_exit_status() {
        let executor = SystemCommandExecutor::default();
        let status = executor
            .run_inherited(OsStr::new("sh"), &sh("exit 7"))
            .expect("sh runs");
        assert_eq!(status.code(), Some(7));
    }
}
