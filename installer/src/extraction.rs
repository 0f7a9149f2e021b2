//! Archive extraction through the platform's own tools.
//!
//! The archive format is taken from the downloaded asset's extension:
//! `.zip` goes to PowerShell's `Expand-Archive` on Windows and to `unzip`
//! elsewhere; everything else is treated as a gzip-compressed tarball and
//! handed to `tar`. A failing tool is fatal; no second backend is tried.

use crate::error::{InstallerError, Result};
use crate::executor::CommandExecutor;
use log::debug;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Archive formats distinguished by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// `.zip`
    Zip,
    /// `.tar.gz`, `.tgz`, and anything unrecognised.
    TarGz,
}

impl ArchiveFormat {
    /// Classify an archive path by its extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use openpilot_installer::extraction::ArchiveFormat;
    /// use std::path::Path;
    ///
    /// assert_eq!(ArchiveFormat::from_path(Path::new("a.ZIP")), ArchiveFormat::Zip);
    /// assert_eq!(ArchiveFormat::from_path(Path::new("a.tgz")), ArchiveFormat::TarGz);
    /// ```
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("zip") => Self::Zip,
            _ => Self::TarGz,
        }
    }
}

/// Trait for extracting downloaded archives, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ExtractionFailed`] when the extraction
    /// facility cannot be started or exits unsuccessfully.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<()>;
}

/// Extractor that shells out to `tar`, `unzip`, or PowerShell.
pub struct ToolExtractor<'a> {
    executor: &'a dyn CommandExecutor,
    windows: bool,
}

impl<'a> ToolExtractor<'a> {
    /// Create an extractor. `windows` selects PowerShell for zip archives.
    pub fn new(executor: &'a dyn CommandExecutor, windows: bool) -> Self {
        Self { executor, windows }
    }

    fn command(&self, format: ArchiveFormat, archive: &Path, dest: &Path) -> ToolInvocation {
        match format {
            ArchiveFormat::Zip if self.windows => ToolInvocation {
                tool: "powershell",
                args: vec![
                    OsString::from("-NoProfile"),
                    OsString::from("-Command"),
                    OsString::from(format!(
                        "Expand-Archive -Path {} -DestinationPath {} -Force",
                        powershell_quote(archive),
                        powershell_quote(dest)
                    )),
                ],
            },
            ArchiveFormat::Zip => ToolInvocation {
                tool: "unzip",
                args: vec![
                    OsString::from("-o"),
                    archive.as_os_str().to_owned(),
                    OsString::from("-d"),
                    dest.as_os_str().to_owned(),
                ],
            },
            ArchiveFormat::TarGz => ToolInvocation {
                tool: "tar",
                args: vec![
                    OsString::from("-xzf"),
                    archive.as_os_str().to_owned(),
                    OsString::from("-C"),
                    dest.as_os_str().to_owned(),
                ],
            },
        }
    }
}

impl std::fmt::Debug for ToolExtractor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExtractor")
            .field("windows", &self.windows)
            .finish_non_exhaustive()
    }
}

struct ToolInvocation {
    tool: &'static str,
    args: Vec<OsString>,
}

impl ArchiveExtractor for ToolExtractor<'_> {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<()> {
        let format = ArchiveFormat::from_path(archive_path);
        let ToolInvocation { tool, args } = self.command(format, archive_path, dest_dir);
        debug!("extracting {} with {tool}", archive_path.display());

        let output = self
            .executor
            .run(OsStr::new(tool), &args)
            .map_err(|err| InstallerError::ExtractionFailed {
                tool,
                reason: err.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => format!("exited with {}", output.status),
                message => message.to_owned(),
            };
            return Err(InstallerError::ExtractionFailed { tool, reason });
        }
        Ok(())
    }
}

/// Quote a path as a PowerShell single-quoted string literal.
fn powershell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "''"))
}
