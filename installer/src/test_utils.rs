//! Shared test utilities for the installer crate.

use crate::error::{InstallerError, Result};
use crate::executor::CommandExecutor;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// What a [`StubExecutor`] should return for one invocation.
#[derive(Debug)]
pub enum StubResponse {
    /// Reply to a captured `run` call.
    Captured(Result<Output>),
    /// Reply to a `run_inherited` call.
    Inherited(Result<ExitStatus>),
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program to execute (e.g., "tar").
    pub cmd: String,
    /// The arguments to pass to the program.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub response: StubResponse,
}

impl ExpectedCall {
    /// Expect a captured invocation of `cmd` with `args`.
    #[must_use]
    pub fn new(cmd: &str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            response: StubResponse::Captured(result),
        }
    }

    /// Expect an inherited-stdio invocation of `cmd` with `args`.
    #[must_use]
    pub fn inherited(cmd: &str, args: &[&str], result: Result<ExitStatus>) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            response: StubResponse::Inherited(result),
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }

    fn next_call(&self, program: &OsStr, args: &[OsString]) -> Result<StubResponse> {
        let received_cmd = program.to_string_lossy().into_owned();
        let received_args: Vec<String> = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(InstallerError::StubMismatch {
                message: format!("unexpected invocation: {received_cmd} {received_args:?}"),
            });
        };

        if call.cmd != received_cmd || call.args != received_args {
            return Err(InstallerError::StubMismatch {
                message: format!(
                    "expected {} {:?}, got {received_cmd} {received_args:?}",
                    call.cmd, call.args
                ),
            });
        }
        Ok(call.response)
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, program: &OsStr, args: &[OsString]) -> Result<Output> {
        match self.next_call(program, args)? {
            StubResponse::Captured(result) => result,
            StubResponse::Inherited(_) => Err(InstallerError::StubMismatch {
                message: "expected run_inherited, got run".to_owned(),
            }),
        }
    }

    fn run_inherited(&self, program: &OsStr, args: &[OsString]) -> Result<ExitStatus> {
        match self.next_call(program, args)? {
            StubResponse::Inherited(result) => result,
            StubResponse::Captured(_) => Err(InstallerError::StubMismatch {
                message: "expected run, got run_inherited".to_owned(),
            }),
        }
    }
}

/// Write a gzip-compressed tarball containing `entries` to `path`.
///
/// Each entry is a relative path and its contents; files are stored with
/// mode `0o644` so tests can observe the installer setting the executable
/// bits itself.
///
/// # Errors
///
/// Returns any I/O error raised while writing the archive.
pub fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *contents)?;
    }
    builder.into_inner()?.finish()?.flush()
}

/// Write a zip archive containing `entries` to `path`.
///
/// # Errors
///
/// Returns any I/O or zip error raised while writing the archive.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default().unix_permissions(0o644);
    for (name, contents) in entries {
        writer.start_file(*name, options).map_err(std::io::Error::other)?;
        writer.write_all(contents)?;
    }
    writer.finish().map_err(std::io::Error::other)?.flush()
}

/// A canned response for [`serve_http`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpReply {
    /// A `200 OK` carrying `body`.
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// An empty response with `status`.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// Serve canned HTTP responses on a loopback port.
///
/// `reply` maps each request path (for example `/acme/tool/releases/...`)
/// to a response. Connections are answered one at a time on a background
/// thread that lives until the test process exits. Returns the base URL,
/// such as `http://127.0.0.1:41234`.
///
/// # Errors
///
/// Returns an error if no loopback port can be bound.
pub fn serve_http<F>(reply: F) -> std::io::Result<String>
where
    F: Fn(&str) -> HttpReply + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let Some(path) = read_request_path(&stream) else {
                continue;
            };
            let HttpReply { status, body } = reply(&path);
            let head = format!(
                "HTTP/1.1 {status} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                reason_phrase(status),
                body.len()
            );
            let written = stream
                .write_all(head.as_bytes())
                .and_then(|()| stream.write_all(&body))
                .and_then(|()| stream.flush());
            if let Err(err) = written {
                log::debug!("test server could not answer {path}: {err}");
            }
        }
    });
    Ok(format!("http://{addr}"))
}

/// Read the request line and headers, returning the request path.
fn read_request_path(stream: &TcpStream) -> Option<String> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) => break,
            Ok(_) if header.trim_end().is_empty() => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }
    request_line.split_whitespace().nth(1).map(ToOwned::to_owned)
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
