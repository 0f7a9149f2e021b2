//! Resolved installer configuration.
//!
//! [`Cli`] holds what the user (or environment) asked for; [`InstallConfig`]
//! holds what the pipeline will actually use, with every default filled in.
//! Resolution happens once at start-up and the result is passed by
//! reference from then on.

use crate::candidates::{ReleaseFeed, VersionSelector};
use crate::cli::Cli;
use crate::error::{InstallerError, Result};
use crate::metadata::BundledVersion;
use crate::platform::HostIdentity;
use camino::{Utf8Path, Utf8PathBuf};

/// Name of the installed tool and prefix of every release asset.
pub const TOOL_NAME: &str = "openpilot";

/// Name of the scratch directory created beside the binary directory.
const SCRATCH_DIR_NAME: &str = "dist";

/// Fully resolved settings for one installer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    /// Tool name used for assets and the installed binary.
    pub tool: String,
    /// Requested release.
    pub selector: VersionSelector,
    /// Release host and repository.
    pub feed: ReleaseFeed,
    /// Where the fallback version comes from.
    pub bundled_version: BundledVersion,
    /// Host to resolve platform tokens for.
    pub host: HostIdentity,
    /// Directory receiving the installed binary.
    pub bin_dir: Utf8PathBuf,
    /// Directory receiving the download and extracted tree.
    pub scratch_dir: Utf8PathBuf,
    /// Suppress progress lines.
    pub quiet: bool,
    /// Print the plan without side effects.
    pub dry_run: bool,
}

impl InstallConfig {
    /// Resolve defaults for everything the CLI left unset.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidConfig`] when the binary directory
    /// must be derived from the running executable and that path cannot be
    /// determined or is not UTF-8.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let bin_dir = match &cli.bin_dir {
            Some(dir) => dir.clone(),
            None => executable_dir()?,
        };
        let scratch_dir = cli
            .scratch_dir
            .clone()
            .unwrap_or_else(|| default_scratch_dir(&bin_dir));
        let selector = cli
            .release
            .as_deref()
            .map_or(VersionSelector::Latest, VersionSelector::from);
        let bundled_version = cli
            .metadata
            .clone()
            .map_or(BundledVersion::Embedded, BundledVersion::Manifest);

        Ok(Self {
            tool: TOOL_NAME.to_owned(),
            selector,
            feed: ReleaseFeed::new(&cli.release_host, &cli.repo),
            bundled_version,
            host: HostIdentity::current(),
            bin_dir,
            scratch_dir,
            quiet: cli.quiet,
            dry_run: cli.dry_run,
        })
    }
}

/// Directory containing the running executable.
///
/// # Errors
///
/// Returns [`InstallerError::InvalidConfig`] if the executable path cannot
/// be determined, has no parent, or is not valid UTF-8.
pub fn executable_dir() -> Result<Utf8PathBuf> {
    let exe = std::env::current_exe().map_err(|err| InstallerError::InvalidConfig {
        reason: format!("cannot determine executable path: {err}"),
    })?;
    let exe = Utf8PathBuf::try_from(exe).map_err(|err| InstallerError::InvalidConfig {
        reason: format!("executable path is not UTF-8: {}", err.as_path().display()),
    })?;
    exe.parent()
        .map(Utf8Path::to_path_buf)
        .ok_or_else(|| InstallerError::InvalidConfig {
            reason: format!("executable path {exe} has no parent directory"),
        })
}

/// `<bin_dir>/../dist`, written without the `..` when the parent is known.
fn default_scratch_dir(bin_dir: &Utf8Path) -> Utf8PathBuf {
    match bin_dir.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.join(SCRATCH_DIR_NAME),
        _ => bin_dir.join("..").join(SCRATCH_DIR_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::{DEFAULT_RELEASE_HOST, DEFAULT_REPO};
    use rstest::rstest;

    fn cli() -> Cli {
        Cli {
            repo: DEFAULT_REPO.to_owned(),
            release_host: DEFAULT_RELEASE_HOST.to_owned(),
            bin_dir: Some(Utf8PathBuf::from("/opt/openpilot/bin")),
            ..Cli::default()
        }
    }

    #[test]
    fn defaults_resolve_to_latest_and_embedded_version() {
        let config = InstallConfig::from_cli(&cli()).expect("config resolves");
        assert_eq!(config.tool, "openpilot");
        assert_eq!(config.selector, VersionSelector::Latest);
        assert_eq!(config.bundled_version, BundledVersion::Embedded);
        assert_eq!(config.feed, ReleaseFeed::default());
        assert_eq!(config.scratch_dir, Utf8PathBuf::from("/opt/openpilot/dist"));
    }

    #[rstest]
    #[case::latest("latest", VersionSelector::Latest)]
    #[case::prefixed("v1.2.3", VersionSelector::Exact("1.2.3".to_owned()))]
    #[case::bare("1.2.3", VersionSelector::Exact("1.2.3".to_owned()))]
    fn release_is_parsed_into_selector(#[case] release: &str, #[case] expected: VersionSelector) {
        let config = InstallConfig::from_cli(&Cli {
            release: Some(release.to_owned()),
            ..cli()
        })
        .expect("config resolves");
        assert_eq!(config.selector, expected);
    }

    #[test]
    fn explicit_scratch_and_metadata_are_kept() {
        let config = InstallConfig::from_cli(&Cli {
            scratch_dir: Some(Utf8PathBuf::from("/tmp/openpilot-scratch")),
            metadata: Some(Utf8PathBuf::from("/opt/openpilot/package.json")),
            ..cli()
        })
        .expect("config resolves");
        assert_eq!(config.scratch_dir, Utf8PathBuf::from("/tmp/openpilot-scratch"));
        assert_eq!(
            config.bundled_version,
            BundledVersion::Manifest(Utf8PathBuf::from("/opt/openpilot/package.json"))
        );
    }

    #[test]
    fn missing_bin_dir_uses_executable_directory() {
        let config = InstallConfig::from_cli(&Cli {
            bin_dir: None,
            ..cli()
        })
        .expect("config resolves");
        let exe = std::env::current_exe().expect("test executable");
        assert_eq!(config.bin_dir.as_std_path(), exe.parent().expect("parent"));
    }

    #[rstest]
    #[case::absolute("/opt/openpilot/bin", "/opt/openpilot/dist")]
    #[case::relative("bin", "bin/../dist")]
    #[case::root("/", "/../dist")]
    fn scratch_dir_defaults_beside_bin_dir(#[case] bin_dir: &str, #[case] expected: &str) {
        let resolved = default_scratch_dir(Utf8Path::new(bin_dir));
        assert_eq!(resolved, Utf8PathBuf::from(expected));
    }

    #[test]
    fn environment_flows_through_cli_into_config() {
        use clap::Parser;

        let config = temp_env::with_vars(
            [
                ("OPENPILOT_VERSION", Some("0.9.1")),
                ("OPENPILOT_REPO", Some("acme/openpilot")),
                ("OPENPILOT_RELEASE_HOST", Some("http://127.0.0.1:9/")),
                ("OPENPILOT_METADATA", None),
                ("OPENPILOT_BIN_DIR", Some("/srv/openpilot/bin")),
                ("OPENPILOT_SCRATCH_DIR", None),
                ("OPENPILOT_DEBUG", None),
            ],
            || {
                let cli = Cli::try_parse_from(["openpilot-install"]).expect("arguments parse");
                InstallConfig::from_cli(&cli).expect("config resolves")
            },
        );
        assert_eq!(config.selector, VersionSelector::Exact("0.9.1".to_owned()));
        assert_eq!(
            config.feed.asset_url(&config.selector, "a.zip"),
            "http://127.0.0.1:9/acme/openpilot/releases/download/v0.9.1/a.zip"
        );
        assert_eq!(config.scratch_dir, Utf8PathBuf::from("/srv/openpilot/dist"));
    }
}
