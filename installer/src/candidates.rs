//! Release asset candidate generation.
//!
//! Release pipelines have published the tool under several naming
//! conventions over time: GoReleaser's underscore form (with the OS token
//! either lowercase or title-cased), a dash-separated form, a legacy `.tgz`
//! extension, and zip archives. Since an asset may satisfy more than one
//! convention, the order produced here is the externally observable
//! fallback priority and must stay fixed.

use crate::platform::PlatformSpec;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Default host serving the release feed.
pub const DEFAULT_RELEASE_HOST: &str = "https://github.com";

/// Default `owner/repo` identifier of the release feed.
pub const DEFAULT_REPO: &str = "JyotirmoyDas05/openpilot";

/// Sentinel selecting the newest published release.
const LATEST: &str = "latest";

/// Which release to install.
///
/// # Examples
///
/// ```
/// use openpilot_installer::candidates::VersionSelector;
///
/// assert_eq!(VersionSelector::from("latest"), VersionSelector::Latest);
/// assert_eq!(
///     VersionSelector::from("v1.2.3"),
///     VersionSelector::Exact("1.2.3".to_owned())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionSelector {
    /// The newest published release.
    #[default]
    Latest,
    /// A concrete version, stored without a leading `v`.
    Exact(String),
}

impl VersionSelector {
    /// Whether this selector is the `latest` sentinel.
    #[must_use]
    pub fn is_latest(&self) -> bool {
        matches!(self, Self::Latest)
    }

    /// URL path segment between `releases/` and the asset name.
    #[must_use]
    pub fn path_segment(&self) -> String {
        match self {
            Self::Latest => "latest/download".to_owned(),
            Self::Exact(version) => format!("download/v{version}"),
        }
    }

    /// Infix inserted after the tool name in versioned underscore templates.
    fn name_infix(&self) -> String {
        match self {
            Self::Latest => String::new(),
            Self::Exact(version) => format!("{version}_"),
        }
    }
}

/// Strip surrounding whitespace and a single leading `v` from a version.
#[must_use]
pub fn normalise_version(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_prefix('v').unwrap_or(trimmed)
}

impl From<&str> for VersionSelector {
    fn from(value: &str) -> Self {
        let version = normalise_version(value);
        if version.is_empty() || version.eq_ignore_ascii_case(LATEST) {
            Self::Latest
        } else {
            Self::Exact(version.to_owned())
        }
    }
}

impl FromStr for VersionSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST),
            Self::Exact(version) => write!(f, "v{version}"),
        }
    }
}

/// Location of the release feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFeed {
    /// Scheme and host, without a trailing slash.
    pub base_url: String,
    /// `owner/repo` identifier.
    pub repo: String,
}

impl ReleaseFeed {
    /// Create a feed, trimming trailing slashes from both parts.
    #[must_use]
    pub fn new(base_url: &str, repo: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            repo: repo.trim_matches('/').to_owned(),
        }
    }

    /// Download URL for `name` under the given version selector.
    ///
    /// # Examples
    ///
    /// ```
    /// use openpilot_installer::candidates::{ReleaseFeed, VersionSelector};
    ///
    /// let feed = ReleaseFeed::new("https://github.com", "acme/tool");
    /// assert_eq!(
    ///     feed.asset_url(&VersionSelector::Exact("1.0.0".to_owned()), "a.zip"),
    ///     "https://github.com/acme/tool/releases/download/v1.0.0/a.zip"
    /// );
    /// ```
    #[must_use]
    pub fn asset_url(&self, selector: &VersionSelector, name: &str) -> String {
        format!(
            "{}/{}/releases/{}/{name}",
            self.base_url,
            self.repo,
            selector.path_segment()
        )
    }
}

impl Default for ReleaseFeed {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASE_HOST, DEFAULT_REPO)
    }
}

/// One archive name guess and the URL it would be served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCandidate {
    /// Asset file name.
    pub name: String,
    /// Full download URL.
    pub url: String,
}

/// Inputs for candidate generation.
#[derive(Debug, Clone, Copy)]
pub struct CandidateRequest<'a> {
    /// Tool name used as the asset prefix.
    pub tool: &'a str,
    /// Where the release assets live.
    pub feed: &'a ReleaseFeed,
    /// Which release to target.
    pub selector: &'a VersionSelector,
    /// Resolved platform tokens.
    pub platform: &'a PlatformSpec,
}

/// Naming templates in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Template {
    CanonicalTarGz,
    DashTarGz,
    LegacyTgz,
    CanonicalZip,
    DashZip,
}

const TEMPLATES: [Template; 5] = [
    Template::CanonicalTarGz,
    Template::DashTarGz,
    Template::LegacyTgz,
    Template::CanonicalZip,
    Template::DashZip,
];

impl Template {
    fn render(self, tool: &str, infix: &str, os: &str, arch: &str) -> String {
        match self {
            Self::CanonicalTarGz => format!("{tool}_{infix}{os}_{arch}.tar.gz"),
            Self::DashTarGz => format!("{tool}-{os}-{arch}.tar.gz"),
            Self::LegacyTgz => format!("{tool}_{infix}{os}_{arch}.tgz"),
            Self::CanonicalZip => format!("{tool}_{infix}{os}_{arch}.zip"),
            Self::DashZip => format!("{tool}-{os}-{arch}.zip"),
        }
    }
}

/// Produce the ordered, duplicate-free candidate list for a request.
///
/// Each template is rendered with the lowercase OS token first and the
/// title-cased token second; a rendering whose name was already emitted is
/// skipped.
///
/// # Examples
///
/// ```
/// use openpilot_installer::candidates::{
///     CandidateRequest, ReleaseFeed, VersionSelector, candidate_assets,
/// };
/// use openpilot_installer::platform::{HostIdentity, PlatformSpec};
///
/// let host = HostIdentity { os: "linux".to_owned(), arch: "x86_64".to_owned() };
/// let platform = PlatformSpec::resolve(&host).expect("supported");
/// let feed = ReleaseFeed::default();
/// let candidates = candidate_assets(&CandidateRequest {
///     tool: "openpilot",
///     feed: &feed,
///     selector: &VersionSelector::Latest,
///     platform: &platform,
/// });
/// assert_eq!(candidates[0].name, "openpilot_linux_x86_64.tar.gz");
/// assert_eq!(candidates.len(), 10);
/// ```
#[must_use]
pub fn candidate_assets(request: &CandidateRequest<'_>) -> Vec<AssetCandidate> {
    let infix = request.selector.name_infix();
    let arch = request.platform.arch_token();
    let title_os = request.platform.title_os_token();
    let os_variants = [request.platform.os_token(), title_os.as_str()];

    let mut seen = HashSet::new();
    let mut candidates = Vec::with_capacity(TEMPLATES.len() * os_variants.len());
    for template in TEMPLATES {
        for os in os_variants {
            let name = template.render(request.tool, &infix, os, arch);
            if seen.insert(name.clone()) {
                let url = request.feed.asset_url(request.selector, &name);
                candidates.push(AssetCandidate { name, url });
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HostIdentity;
    use rstest::{fixture, rstest};

    #[fixture]
    fn linux_x86() -> PlatformSpec {
        PlatformSpec::resolve(&HostIdentity {
            os: "linux".to_owned(),
            arch: "x86_64".to_owned(),
        })
        .expect("supported")
    }

    fn names(selector: &VersionSelector, platform: &PlatformSpec) -> Vec<String> {
        let feed = ReleaseFeed::default();
        candidate_assets(&CandidateRequest {
            tool: "openpilot",
            feed: &feed,
            selector,
            platform,
        })
        .into_iter()
        .map(|c| c.name)
        .collect()
    }

    #[rstest]
    fn latest_names_follow_template_order(linux_x86: PlatformSpec) {
        assert_eq!(
            names(&VersionSelector::Latest, &linux_x86),
            vec![
                "openpilot_linux_x86_64.tar.gz",
                "openpilot_Linux_x86_64.tar.gz",
                "openpilot-linux-x86_64.tar.gz",
                "openpilot-Linux-x86_64.tar.gz",
                "openpilot_linux_x86_64.tgz",
                "openpilot_Linux_x86_64.tgz",
                "openpilot_linux_x86_64.zip",
                "openpilot_Linux_x86_64.zip",
                "openpilot-linux-x86_64.zip",
                "openpilot-Linux-x86_64.zip",
            ]
        );
    }

    #[rstest]
    fn versioned_names_carry_version_infix(linux_x86: PlatformSpec) {
        let selector = VersionSelector::Exact("1.2.3".to_owned());
        let generated = names(&selector, &linux_x86);
        assert_eq!(generated[0], "openpilot_1.2.3_linux_x86_64.tar.gz");
        assert_eq!(generated[2], "openpilot-linux-x86_64.tar.gz");
        assert_eq!(generated[4], "openpilot_1.2.3_linux_x86_64.tgz");
        assert_eq!(generated[6], "openpilot_1.2.3_linux_x86_64.zip");
        assert_eq!(generated[8], "openpilot-linux-x86_64.zip");
    }

    #[rstest]
    fn generation_is_deterministic(linux_x86: PlatformSpec) {
        let selector = VersionSelector::Exact("0.4.0".to_owned());
        assert_eq!(names(&selector, &linux_x86), names(&selector, &linux_x86));
    }

    #[rstest]
    #[case::latest(VersionSelector::Latest)]
    #[case::versioned(VersionSelector::Exact("2.0.0".to_owned()))]
    fn names_are_unique(linux_x86: PlatformSpec, #[case] selector: VersionSelector) {
        let generated = names(&selector, &linux_x86);
        let unique: HashSet<_> = generated.iter().collect();
        assert_eq!(unique.len(), generated.len());
    }

    #[rstest]
    fn latest_urls_use_latest_download_segment(linux_x86: PlatformSpec) {
        let feed = ReleaseFeed::new("https://github.com/", "acme/tool");
        let candidates = candidate_assets(&CandidateRequest {
            tool: "openpilot",
            feed: &feed,
            selector: &VersionSelector::Latest,
            platform: &linux_x86,
        });
        assert_eq!(
            candidates[0].url,
            "https://github.com/acme/tool/releases/latest/download/openpilot_linux_x86_64.tar.gz"
        );
    }

    #[rstest]
    fn versioned_urls_use_tag_segment(linux_x86: PlatformSpec) {
        let feed = ReleaseFeed::default();
        let selector = VersionSelector::Exact("1.2.3".to_owned());
        let candidates = candidate_assets(&CandidateRequest {
            tool: "openpilot",
            feed: &feed,
            selector: &selector,
            platform: &linux_x86,
        });
        for candidate in &candidates {
            assert!(
                candidate
                    .url
                    .starts_with("https://github.com/JyotirmoyDas05/openpilot/releases/download/v1.2.3/"),
                "unexpected url {}",
                candidate.url
            );
            assert!(candidate.url.ends_with(&candidate.name));
        }
    }

    #[rstest]
    #[case::plain("1.2.3", VersionSelector::Exact("1.2.3".to_owned()))]
    #[case::prefixed("v1.2.3", VersionSelector::Exact("1.2.3".to_owned()))]
    #[case::latest("latest", VersionSelector::Latest)]
    #[case::latest_upper("LATEST", VersionSelector::Latest)]
    #[case::blank("  ", VersionSelector::Latest)]
    #[case::bare_v("v", VersionSelector::Latest)]
    fn selector_parsing(#[case] raw: &str, #[case] expected: VersionSelector) {
        assert_eq!(VersionSelector::from(raw), expected);
    }

    #[test]
    fn selector_display_round_trips_through_parse() {
        let selector = VersionSelector::Exact("0.9.1".to_owned());
        assert_eq!(selector.to_string(), "v0.9.1");
        assert_eq!(VersionSelector::from(selector.to_string().as_str()), selector);
    }
}
