//! User-facing progress output.
//!
//! Progress lines are written to stderr so stdout stays free for the
//! installed tool. Diagnostic detail (every candidate, every failure
//! reason) goes through `log` instead and is only visible in debug mode.

use std::io::Write;

/// Write a single line to the provided stderr handle, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Progress sink that honours `--quiet`.
pub struct Progress<'a> {
    quiet: bool,
    stderr: &'a mut dyn Write,
}

impl<'a> Progress<'a> {
    /// Wrap a stderr handle.
    pub fn new(quiet: bool, stderr: &'a mut dyn Write) -> Self {
        Self { quiet, stderr }
    }

    /// Emit a progress line unless output is suppressed.
    pub fn line(&mut self, message: impl std::fmt::Display) {
        if !self.quiet {
            write_stderr_line(self.stderr, message);
        }
    }
}

impl std::fmt::Debug for Progress<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

/// Log level for the given debug setting.
#[must_use]
pub fn log_level(debug: bool) -> log::LevelFilter {
    if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    }
}

/// Install the `env_logger` backend.
///
/// `RUST_LOG` still overrides the level chosen from `debug`. A second call
/// is a no-op.
pub fn init_logging(debug: bool) {
    let _ = env_logger::Builder::new()
        .filter_level(log_level(debug))
        .format_timestamp(None)
        .parse_default_env()
        .try_init();
}

/// Format the success message printed after installation.
#[must_use]
pub fn success_message(binary: &camino::Utf8Path) -> String {
    format!("Installed binary to {binary}")
}
