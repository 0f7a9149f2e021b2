//! openpilot installer CLI entrypoint.
//!
//! This binary downloads the release archive matching the host platform,
//! extracts it, and installs the openpilot binary beside itself. Package
//! managers run it from a post-install hook.

use clap::Parser;
use openpilot_installer::cli::Cli;
use openpilot_installer::config::InstallConfig;
use openpilot_installer::download::HttpTransport;
use openpilot_installer::error::Result;
use openpilot_installer::executor::SystemCommandExecutor;
use openpilot_installer::extraction::ToolExtractor;
use openpilot_installer::install::{InstallContext, describe_plan, install};
use openpilot_installer::output::{init_logging, write_stderr_line};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let config = InstallConfig::from_cli(cli)?;

    // Dry-run mode: show what would be done without side effects
    if config.dry_run {
        return describe_plan(&config, stderr);
    }

    let executor = SystemCommandExecutor::default();
    let extractor = ToolExtractor::new(&executor, cfg!(windows));
    let context = InstallContext {
        transport: &HttpTransport,
        extractor: &extractor,
        version_source: &config.bundled_version,
    };
    install(&config, &context, stderr)?;
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("openpilot install failed: {err}"));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openpilot_installer::error::InstallerError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = InstallerError::UnsupportedArchitecture {
            arch: "mips".to_owned(),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("unsupported architecture: mips"));
    }

    #[test]
    fn dry_run_succeeds_without_network() {
        let cli = Cli {
            dry_run: true,
            bin_dir: Some("/opt/openpilot/bin".into()),
            repo: "acme/openpilot".to_owned(),
            release_host: "http://127.0.0.1:9".to_owned(),
            ..Cli::default()
        };

        let mut stderr = Vec::new();
        let result = run(&cli, &mut stderr);

        // Hosts outside the release tables still fail cleanly.
        match result {
            Ok(()) => {
                let text = String::from_utf8(stderr).expect("utf8");
                assert!(text.contains("http://127.0.0.1:9/acme/openpilot/releases/latest/download/"));
            }
            Err(err) => assert!(matches!(
                err,
                InstallerError::UnsupportedPlatform { .. }
                    | InstallerError::UnsupportedArchitecture { .. }
            )),
        }
    }
}
