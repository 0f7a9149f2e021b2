//! Locating the tool binary inside an extracted archive.
//!
//! Release archives are not consistent about layout: some put the binary
//! at the top level, others nest it under a versioned directory. The search
//! walks the whole extracted tree with an explicit stack and remembers
//! every directory it has entered, so symlink loops terminate.

use crate::error::{InstallerError, Result};
use camino::Utf8PathBuf;
use log::trace;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Find the first regular file named exactly `name` beneath `root`.
///
/// Entries are visited depth first in name order: a subdirectory that sorts
/// before a file is searched completely before that file is considered, so
/// the result does not depend on the order the filesystem reports them in.
/// Directories that happen to share the binary's name are descended into,
/// never returned.
///
/// # Errors
///
/// Returns [`InstallerError::BinaryNotFound`] when no matching file exists,
/// or [`InstallerError::SearchFailed`] when `root` itself cannot be read.
///
/// # Examples
///
/// ```no_run
/// use openpilot_installer::locator::find_binary;
/// use std::path::Path;
///
/// let binary = find_binary(Path::new("dist/extracted"), "openpilot")?;
/// assert!(binary.ends_with("openpilot"));
/// # Ok::<(), openpilot_installer::error::InstallerError>(())
/// ```
pub fn find_binary(root: &Path, name: &str) -> Result<PathBuf> {
    let search_failed = |err: std::io::Error| InstallerError::SearchFailed {
        path: utf8_lossy(root),
        reason: err.to_string(),
    };
    let mut visited = HashSet::from([root.canonicalize().map_err(search_failed)?]);
    // Reversed so the lowest name pops first.
    let mut stack: Vec<PathBuf> = sorted_entries(root).map_err(search_failed)?;
    stack.reverse();

    while let Some(path) = stack.pop() {
        // Follows symlinks, so linked directories are searched too.
        let Ok(metadata) = std::fs::metadata(&path) else {
            continue;
        };
        if metadata.is_file() {
            if path.file_name().is_some_and(|n| n == name) {
                return Ok(path);
            }
            continue;
        }
        if !metadata.is_dir() {
            continue;
        }

        let Ok(canonical) = path.canonicalize() else {
            continue;
        };
        if !visited.insert(canonical) {
            trace!("already visited {}", path.display());
            continue;
        }
        match sorted_entries(&path) {
            Ok(entries) => stack.extend(entries.into_iter().rev()),
            Err(err) => trace!("skipping unreadable {}: {err}", path.display()),
        }
    }

    Err(InstallerError::BinaryNotFound {
        name: name.to_owned(),
        root: utf8_lossy(root),
    })
}

fn utf8_lossy(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from(path.to_string_lossy().into_owned())
}

fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}
