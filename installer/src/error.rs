//! Error types for the openpilot installer and launcher.
//!
//! Each variant names the pipeline stage that failed so the binaries can
//! print a single actionable diagnostic before exiting with status 1.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while installing or launching the tool.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The host operating system has no entry in the release-OS table.
    #[error("unsupported platform: {os}")]
    UnsupportedPlatform {
        /// Raw OS identifier reported by the runtime.
        os: String,
    },

    /// The host CPU architecture has no entry in the release-arch table.
    #[error("unsupported architecture: {arch}")]
    UnsupportedArchitecture {
        /// Raw architecture identifier reported by the runtime.
        arch: String,
    },

    /// Every candidate in every download round failed.
    #[error(
        "all download attempts failed ({last_error}); tried: {}",
        .attempted.join(", ")
    )]
    AllDownloadAttemptsFailed {
        /// Description of the last candidate-level failure.
        last_error: String,
        /// Every URL attempted across the primary and fallback rounds.
        attempted: Vec<String>,
    },

    /// The archive extraction tool failed or could not be started.
    #[error("{tool} extraction failed: {reason}")]
    ExtractionFailed {
        /// Name of the extraction facility (`tar`, `unzip`, `powershell`).
        tool: &'static str,
        /// Captured stderr or spawn error.
        reason: String,
    },

    /// The scratch or extraction directory could not be prepared.
    #[error("failed to prepare working directory {path}: {reason}")]
    ScratchDirFailed {
        /// Directory that could not be created or cleared.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// The extracted tree could not be searched.
    #[error("failed to search extracted files under {path}: {reason}")]
    SearchFailed {
        /// Root of the search.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// The extracted tree does not contain the expected binary.
    #[error("binary {name} not found after extraction under {root}")]
    BinaryNotFound {
        /// Expected file name.
        name: String,
        /// Directory that was searched.
        root: Utf8PathBuf,
    },

    /// The launcher could not find the installed binary.
    #[error("executable missing at {path}; reinstall package")]
    MissingExecutable {
        /// Path where the binary was expected.
        path: Utf8PathBuf,
    },

    /// Copying the binary into place or setting its permissions failed.
    #[error("failed to install binary to {path}: {reason}")]
    PlacementFailed {
        /// Final installation path.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// Configuration could not be resolved.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
