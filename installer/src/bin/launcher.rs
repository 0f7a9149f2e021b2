//! openpilot launcher entrypoint.
//!
//! Runs the installed openpilot binary that sits beside this executable,
//! forwarding every argument and the standard streams, and exits with the
//! binary's exit code.

use openpilot_installer::config::TOOL_NAME;
use openpilot_installer::error::{InstallerError, Result};
use openpilot_installer::executor::SystemCommandExecutor;
use openpilot_installer::launcher::{installed_binary_path, launch};
use openpilot_installer::output::{init_logging, write_stderr_line};
use std::ffi::OsString;
use std::io::Write;

fn main() {
    init_logging(false);
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    let mut stderr = std::io::stderr();
    let exit_code = exit_code_for_launch(run(&args), &mut stderr);
    std::process::exit(exit_code);
}

fn run(args: &[OsString]) -> Result<i32> {
    let launcher = std::env::current_exe().map_err(|err| InstallerError::InvalidConfig {
        reason: format!("cannot determine launcher path: {err}"),
    })?;
    let binary_name = format!("{TOOL_NAME}{}", std::env::consts::EXE_SUFFIX);
    let binary = installed_binary_path(&launcher, &binary_name);
    launch(&binary, args, &SystemCommandExecutor::default())
}

fn exit_code_for_launch(result: Result<i32>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(code) => code,
        Err(err) => {
            write_stderr_line(stderr, format!("openpilot: {err}"));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn child_code_is_propagated() {
        let mut stderr = Vec::new();
        assert_eq!(exit_code_for_launch(Ok(3), &mut stderr), 3);
        assert!(stderr.is_empty());
    }

    #[test]
    fn launch_errors_exit_one_with_diagnostic() {
        let err = InstallerError::MissingExecutable {
            path: Utf8PathBuf::from("/opt/openpilot/bin/openpilot"),
        };
        let mut stderr = Vec::new();
        assert_eq!(exit_code_for_launch(Err(err), &mut stderr), 1);

        let text = String::from_utf8(stderr).expect("utf8");
        assert!(text.contains("/opt/openpilot/bin/openpilot"));
        assert!(text.contains("reinstall package"));
    }
}
