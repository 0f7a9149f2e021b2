//! Launch the installed binary on the user's behalf.
//!
//! Package managers put the launcher on `PATH`; the real binary sits next
//! to it. The launcher forwards its arguments untouched, shares its
//! standard streams with the child, and exits with the child's code.

use crate::error::{InstallerError, Result};
use crate::executor::CommandExecutor;
use camino::Utf8PathBuf;
use log::debug;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Exit code used when the child was terminated without one.
pub const SIGNAL_EXIT_CODE: i32 = 1;

/// Path of the installed binary next to `launcher_exe`.
///
/// # Examples
///
/// ```
/// use openpilot_installer::launcher::installed_binary_path;
/// use std::path::Path;
///
/// let path = installed_binary_path(Path::new("/opt/openpilot/bin/openpilot-launch"), "openpilot");
/// assert_eq!(path, Path::new("/opt/openpilot/bin/openpilot"));
/// ```
#[must_use]
pub fn installed_binary_path(launcher_exe: &Path, binary_name: &str) -> PathBuf {
    launcher_exe
        .parent()
        .map_or_else(|| PathBuf::from(binary_name), |dir| dir.join(binary_name))
}

/// Run `binary` with `args`, returning the exit code to propagate.
///
/// # Errors
///
/// Returns [`InstallerError::MissingExecutable`] when `binary` does not
/// exist, or an I/O error when it cannot be started.
pub fn launch(binary: &Path, args: &[OsString], executor: &dyn CommandExecutor) -> Result<i32> {
    if !binary.is_file() {
        return Err(InstallerError::MissingExecutable {
            path: Utf8PathBuf::from(binary.to_string_lossy().into_owned()),
        });
    }
    debug!("launching {} with {} argument(s)", binary.display(), args.len());
    let status = executor.run_inherited(OsStr::new(binary), args)?;
    Ok(exit_code(status))
}

/// Exit code to propagate for a finished child.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(SIGNAL_EXIT_CODE)
}
