//! End-to-end installation pipeline.
//!
//! The stages run strictly in order and any failure aborts the run:
//!
//! 1. Resolve the platform tokens for the host.
//! 2. Work out where the binary will land.
//! 3. Download the first resolvable candidate, falling back to the bundled
//!    version when `latest` resolves nothing.
//! 4. Extract into a freshly emptied directory and locate the binary.
//! 5. Copy it into place and make it executable.
//!
//! Network, extraction and metadata access are injected through
//! [`InstallContext`] so the pipeline runs in tests without a release feed.

use crate::config::InstallConfig;
use crate::download::AssetTransport;
use crate::error::{InstallerError, Result};
use crate::extraction::ArchiveExtractor;
use crate::fallback::{DownloadStage, ReleaseQuery, download_with_fallback};
use crate::locator::find_binary;
use crate::metadata::VersionSource;
use crate::output::{Progress, success_message, write_stderr_line};
use crate::platform::PlatformSpec;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::io::Write;
use std::path::Path;

/// Name of the extraction directory inside the scratch directory.
const EXTRACT_DIR_NAME: &str = "extracted";

/// Final location of the installed binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    /// Directory receiving the binary.
    pub dir: Utf8PathBuf,
    /// Binary file name, including `.exe` on Windows.
    pub binary_name: String,
}

impl InstallTarget {
    /// Target for `tool` in `dir` on `platform`.
    ///
    /// # Examples
    ///
    /// ```
    /// use openpilot_installer::install::InstallTarget;
    /// use openpilot_installer::platform::{HostIdentity, PlatformSpec};
    ///
    /// let host = HostIdentity { os: "win32".to_owned(), arch: "x64".to_owned() };
    /// let platform = PlatformSpec::resolve(&host).expect("supported host");
    /// let target = InstallTarget::new("C:/openpilot/bin".into(), "openpilot", &platform);
    /// assert_eq!(target.path().as_str(), "C:/openpilot/bin/openpilot.exe");
    /// ```
    #[must_use]
    pub fn new(dir: Utf8PathBuf, tool: &str, platform: &PlatformSpec) -> Self {
        Self {
            dir,
            binary_name: format!("{tool}{}", platform.executable_suffix()),
        }
    }

    /// Full path of the installed binary.
    #[must_use]
    pub fn path(&self) -> Utf8PathBuf {
        self.dir.join(&self.binary_name)
    }
}

/// Collaborators used by the pipeline.
pub struct InstallContext<'a> {
    /// Release asset transport.
    pub transport: &'a dyn AssetTransport,
    /// Archive extraction facility.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Source of the fallback version.
    pub version_source: &'a dyn VersionSource,
}

impl std::fmt::Debug for InstallContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallContext").finish_non_exhaustive()
    }
}

/// Run the full installation and return the installed binary's path.
///
/// # Errors
///
/// Returns the error of the first stage that fails: an unsupported
/// platform, exhausted downloads, a failed extraction, a missing binary, or
/// a failed copy.
pub fn install(
    config: &InstallConfig,
    context: &InstallContext<'_>,
    stderr: &mut dyn Write,
) -> Result<Utf8PathBuf> {
    let platform = PlatformSpec::resolve(&config.host)?;
    let target = InstallTarget::new(config.bin_dir.clone(), &config.tool, &platform);
    debug!("installing {} for {platform}", target.path());

    let mut progress = Progress::new(config.quiet, stderr);
    let scratch = config.scratch_dir.as_std_path();
    std::fs::create_dir_all(scratch).map_err(|err| scratch_failed(scratch, &err))?;

    let query = ReleaseQuery {
        tool: &config.tool,
        feed: &config.feed,
        platform: &platform,
    };
    let stage = DownloadStage {
        transport: context.transport,
        version_source: context.version_source,
        download_dir: scratch,
    };
    let asset = download_with_fallback(&query, &config.selector, &stage, &mut progress)?;

    let extract_dir = scratch.join(EXTRACT_DIR_NAME);
    reset_dir(&extract_dir)?;
    context.extractor.extract(&asset.path, &extract_dir)?;
    let binary = find_binary(&extract_dir, &target.binary_name)?;
    debug!("found {}", binary.display());

    let installed = place_binary(&binary, &target)?;
    progress.line(success_message(&installed));
    Ok(installed)
}

/// Print the install target and the candidate URLs without side effects.
///
/// # Errors
///
/// Returns an error if the host platform is unsupported.
pub fn describe_plan(config: &InstallConfig, stderr: &mut dyn Write) -> Result<()> {
    let platform = PlatformSpec::resolve(&config.host)?;
    let target = InstallTarget::new(config.bin_dir.clone(), &config.tool, &platform);
    let query = ReleaseQuery {
        tool: &config.tool,
        feed: &config.feed,
        platform: &platform,
    };

    write_stderr_line(stderr, "Dry run - no files will be modified");
    write_stderr_line(stderr, "");
    write_stderr_line(stderr, format!("Platform:        {platform}"));
    write_stderr_line(stderr, format!("Install target:  {}", target.path()));
    write_stderr_line(stderr, format!("Scratch dir:     {}", config.scratch_dir));
    write_stderr_line(stderr, format!("Release:         {}", config.selector));
    write_stderr_line(stderr, "");
    write_stderr_line(stderr, "Candidates:");
    for candidate in query.candidates(&config.selector) {
        write_stderr_line(stderr, format!("  {}", candidate.url));
    }
    if config.selector.is_latest() {
        write_stderr_line(stderr, "");
        write_stderr_line(
            stderr,
            "If no latest asset resolves, the bundled package version is tried next.",
        );
    }
    Ok(())
}

/// Remove `dir` if present and recreate it empty.
fn reset_dir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => debug!("cleared {}", dir.display()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(scratch_failed(dir, &err)),
    }
    std::fs::create_dir_all(dir).map_err(|err| scratch_failed(dir, &err))
}

fn scratch_failed(dir: &Path, err: &std::io::Error) -> InstallerError {
    InstallerError::ScratchDirFailed {
        path: Utf8PathBuf::from(dir.to_string_lossy().into_owned()),
        reason: err.to_string(),
    }
}

/// Copy `binary` to the target path, replacing any prior install.
fn place_binary(binary: &Path, target: &InstallTarget) -> Result<Utf8PathBuf> {
    let dest = target.path();
    let placement_failed = |err: std::io::Error| InstallerError::PlacementFailed {
        path: dest.clone(),
        reason: err.to_string(),
    };

    std::fs::create_dir_all(&target.dir).map_err(placement_failed)?;
    std::fs::copy(binary, &dest).map_err(placement_failed)?;
    make_executable(&dest).map_err(placement_failed)?;
    Ok(dest)
}

#[cfg(unix)]
fn make_executable(path: &Utf8Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    // rwxr-xr-x
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Utf8Path) -> std::io::Result<()> {
    Ok(())
}
