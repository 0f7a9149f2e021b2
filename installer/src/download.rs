//! Sequential release asset download.
//!
//! Candidates are attempted strictly in order, one request each, and the
//! first archive written in full wins. Attempts never overlap: the order is
//! the fallback priority, and speculative parallel requests would only
//! flood the release feed.

use crate::candidates::AssetCandidate;
use crate::output::Progress;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Upper bound on a single download attempt, body included.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Byte-stream transport for release assets.
///
/// Abstractions allow tests to simulate a release feed without network
/// access.
#[cfg_attr(test, mockall::automock)]
pub trait AssetTransport {
    /// Retrieve `url` and write the full body to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the file cannot be written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Errors arising from a single candidate download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed or timed out.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested asset was not found (HTTP 404).
    #[error("artefact not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// A successfully downloaded archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAsset {
    /// The candidate that resolved.
    pub candidate: AssetCandidate,
    /// Where the archive was written.
    pub path: PathBuf,
}

/// Outcome of a download round in which no candidate resolved.
#[derive(Debug)]
pub struct RoundFailure {
    /// Every URL attempted, in order.
    pub attempted: Vec<String>,
    /// The last candidate-level failure, absent only when there were no
    /// candidates at all.
    pub last_error: Option<DownloadError>,
}

impl RoundFailure {
    /// Description of the last failure for diagnostics.
    #[must_use]
    pub fn last_error_message(&self) -> String {
        self.last_error.as_ref().map_or_else(
            || "no release asset candidates".to_owned(),
            ToString::to_string,
        )
    }
}

/// Attempt `candidates` in order, writing each to
/// `<download_dir>/<candidate name>`, and stop at the first success.
///
/// A failed attempt removes whatever partial file it left behind before the
/// next candidate is tried, so a later success is never confused with a
/// stale write.
///
/// # Errors
///
/// Returns a [`RoundFailure`] carrying every attempted URL and the last
/// error when no candidate resolves.
pub fn download_first(
    candidates: &[AssetCandidate],
    download_dir: &Path,
    transport: &dyn AssetTransport,
    progress: &mut Progress<'_>,
) -> Result<DownloadedAsset, RoundFailure> {
    let mut attempted = Vec::with_capacity(candidates.len());
    let mut last_error = None;

    for candidate in candidates {
        progress.line(format!("Trying {}", candidate.url));
        attempted.push(candidate.url.clone());
        let dest = download_dir.join(&candidate.name);

        match transport.fetch(&candidate.url, &dest) {
            Ok(()) => {
                progress.line(format!("Downloaded {}", candidate.name));
                return Ok(DownloadedAsset {
                    candidate: candidate.clone(),
                    path: dest,
                });
            }
            Err(err) => {
                debug!("failed {}: {err}", candidate.name);
                discard_partial(&dest);
                last_error = Some(err);
            }
        }
    }

    Err(RoundFailure {
        attempted,
        last_error,
    })
}

fn discard_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("removed partial download {}", path.display()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => debug!("could not remove partial download {}: {err}", path.display()),
    }
}

/// HTTP transport using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl AssetTransport for HttpTransport {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file).map_err(|e| {
            DownloadError::HttpError {
                url: url.to_owned(),
                reason: e.to_string(),
            }
        })?;
        file.sync_all()?;
        Ok(())
    }
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
