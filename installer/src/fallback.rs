//! Download rounds with version fallback.
//!
//! A `latest` request is sometimes made before the newest release has its
//! assets uploaded under the expected names. When the first round comes up
//! empty for `latest`, one more round is run against the version bundled
//! with the installer. Failures from both rounds are folded into a single
//! [`InstallerError::AllDownloadAttemptsFailed`].

use crate::candidates::{
    AssetCandidate, CandidateRequest, ReleaseFeed, VersionSelector, candidate_assets,
};
use crate::download::{AssetTransport, DownloadedAsset, RoundFailure, download_first};
use crate::error::{InstallerError, Result};
use crate::metadata::VersionSource;
use crate::output::Progress;
use crate::platform::PlatformSpec;
use log::debug;
use std::path::Path;

/// What to download, independent of the version selector.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseQuery<'a> {
    /// Tool name used as the asset prefix.
    pub tool: &'a str,
    /// Where the release assets live.
    pub feed: &'a ReleaseFeed,
    /// Resolved platform tokens.
    pub platform: &'a PlatformSpec,
}

impl ReleaseQuery<'_> {
    /// Candidates for the given selector.
    #[must_use]
    pub fn candidates(&self, selector: &VersionSelector) -> Vec<AssetCandidate> {
        candidate_assets(&CandidateRequest {
            tool: self.tool,
            feed: self.feed,
            selector,
            platform: self.platform,
        })
    }
}

/// Collaborators for the download stage.
pub struct DownloadStage<'a> {
    /// Byte-stream transport.
    pub transport: &'a dyn AssetTransport,
    /// Source of the fallback version.
    pub version_source: &'a dyn VersionSource,
    /// Directory receiving the archive.
    pub download_dir: &'a Path,
}

impl std::fmt::Debug for DownloadStage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadStage")
            .field("download_dir", &self.download_dir)
            .finish_non_exhaustive()
    }
}

/// Download the first resolvable candidate for `selector`, falling back to
/// the bundled version when `latest` resolves nothing.
///
/// # Errors
///
/// Returns [`InstallerError::AllDownloadAttemptsFailed`] with every URL
/// attempted across both rounds when no candidate resolves.
pub fn download_with_fallback(
    query: &ReleaseQuery<'_>,
    selector: &VersionSelector,
    stage: &DownloadStage<'_>,
    progress: &mut Progress<'_>,
) -> Result<DownloadedAsset> {
    let primary = run_round(query, selector, stage, progress);
    let first_failure = match primary {
        Ok(asset) => return Ok(asset),
        Err(failure) => failure,
    };

    if !selector.is_latest() {
        return Err(exhausted(vec![first_failure]));
    }

    let version = match stage.version_source.bundled_version() {
        Ok(version) => version,
        Err(err) => {
            debug!("failed to load package version fallback: {err}");
            return Err(exhausted(vec![first_failure]));
        }
    };

    progress.line(format!(
        "latest assets missing; retrying with package version {version}"
    ));
    let fallback_selector = VersionSelector::Exact(version);
    run_round(query, &fallback_selector, stage, progress)
        .map_err(|second_failure| exhausted(vec![first_failure, second_failure]))
}

fn run_round(
    query: &ReleaseQuery<'_>,
    selector: &VersionSelector,
    stage: &DownloadStage<'_>,
    progress: &mut Progress<'_>,
) -> std::result::Result<DownloadedAsset, RoundFailure> {
    let candidates = query.candidates(selector);
    debug!(
        "candidates for {selector}: {}",
        candidates
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    download_first(&candidates, stage.download_dir, stage.transport, progress)
}

/// Fold failed rounds into the fatal aggregate error.
fn exhausted(rounds: Vec<RoundFailure>) -> InstallerError {
    let last_error = rounds
        .last()
        .map_or_else(|| "no download rounds ran".to_owned(), RoundFailure::last_error_message);
    let attempted = rounds
        .into_iter()
        .flat_map(|round| round.attempted)
        .collect();
    InstallerError::AllDownloadAttemptsFailed {
        last_error,
        attempted,
    }
}
