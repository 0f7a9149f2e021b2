//! Bundled package metadata.
//!
//! When a `latest` release has not been published under any known asset
//! name yet, the installer retries with the version it was packaged for.
//! That version comes either from a manifest shipped next to the installer
//! (`package.json` or a Cargo-style TOML manifest) or, when none is
//! configured, from the crate's own version.

use crate::candidates::normalise_version;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Errors arising while reading bundled metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The manifest could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Manifest path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid JSON or TOML.
    #[error("failed to parse {path}: {reason}")]
    Parse {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The manifest has no usable version.
    #[error("no version recorded in {origin}")]
    MissingVersion {
        /// Where the version was looked up.
        origin: String,
    },
}

/// Source of the concrete version used by the fallback round.
#[cfg_attr(test, mockall::automock)]
pub trait VersionSource {
    /// Return the bundled version without a leading `v`.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be read or is empty.
    fn bundled_version(&self) -> Result<String, MetadataError>;
}

/// Where the bundled version is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundledVersion {
    /// The installer crate's own version.
    Embedded,
    /// A `.json` or `.toml` package manifest.
    Manifest(Utf8PathBuf),
}

impl VersionSource for BundledVersion {
    fn bundled_version(&self) -> Result<String, MetadataError> {
        match self {
            Self::Embedded => usable(env!("CARGO_PKG_VERSION"), "installer crate"),
            Self::Manifest(path) => read_manifest_version(path),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonManifest {
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlManifest {
    package: Option<TomlPackage>,
}

#[derive(Debug, Deserialize)]
struct TomlPackage {
    version: Option<String>,
}

/// Read the version recorded in a package manifest.
///
/// Files ending in `.toml` are read as Cargo manifests (`[package]
/// version`); anything else is read as JSON with a top-level `version`.
///
/// # Errors
///
/// Returns [`MetadataError`] if the file cannot be read or parsed, or if it
/// records no version.
pub fn read_manifest_version(path: &Utf8Path) -> Result<String, MetadataError> {
    let contents = std::fs::read_to_string(path).map_err(|source| MetadataError::Read {
        path: path.to_owned(),
        source,
    })?;
    let parse_error = |reason: String| MetadataError::Parse {
        path: path.to_owned(),
        reason,
    };

    let version = if path.extension() == Some("toml") {
        toml::from_str::<TomlManifest>(&contents)
            .map_err(|e| parse_error(e.to_string()))?
            .package
            .and_then(|package| package.version)
    } else {
        serde_json::from_str::<JsonManifest>(&contents)
            .map_err(|e| parse_error(e.to_string()))?
            .version
    };

    usable(version.as_deref().unwrap_or_default(), path.as_str())
}

fn usable(raw: &str, origin: &str) -> Result<String, MetadataError> {
    let version = normalise_version(raw);
    if version.is_empty() {
        return Err(MetadataError::MissingVersion {
            origin: origin.to_owned(),
        });
    }
    Ok(version.to_owned())
}
