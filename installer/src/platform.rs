//! Host platform resolution for release asset naming.
//!
//! Release archives encode the operating system and CPU architecture in
//! their file names. This module maps the identifiers reported by the
//! runtime onto those tokens using two fixed tables. Anything outside the
//! tables is rejected before any network access takes place.

use crate::error::{InstallerError, Result};
use std::fmt;

/// Raw OS identifier to release OS token.
const OS_TOKENS: &[(&str, &str)] = &[
    ("linux", "linux"),
    ("macos", "darwin"),
    ("darwin", "darwin"),
    ("windows", "windows"),
    ("win32", "windows"),
];

/// Raw architecture identifier to release architecture token.
const ARCH_TOKENS: &[(&str, &str)] = &[
    ("x86_64", "x86_64"),
    ("x64", "x86_64"),
    ("amd64", "x86_64"),
    ("aarch64", "arm64"),
    ("arm64", "arm64"),
    ("arm", "arm"),
    ("x86", "i386"),
    ("i686", "i386"),
    ("ia32", "i386"),
];

/// Raw platform identifiers as reported by the runtime.
///
/// Defaults to [`std::env::consts::OS`] and [`std::env::consts::ARCH`]; the
/// installer configuration may override both to simulate another host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    /// Raw OS identifier (for example `linux` or `macos`).
    pub os: String,
    /// Raw architecture identifier (for example `x86_64` or `aarch64`).
    pub arch: String,
}

impl HostIdentity {
    /// Identity of the machine running this process.
    #[must_use]
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_owned(),
            arch: std::env::consts::ARCH.to_owned(),
        }
    }
}

impl Default for HostIdentity {
    fn default() -> Self {
        Self::current()
    }
}

/// OS and architecture tokens as they appear in release asset names.
///
/// # Examples
///
/// ```
/// use openpilot_installer::platform::{HostIdentity, PlatformSpec};
///
/// let host = HostIdentity { os: "macos".to_owned(), arch: "aarch64".to_owned() };
/// let spec = PlatformSpec::resolve(&host).expect("supported host");
/// assert_eq!(spec.os_token(), "darwin");
/// assert_eq!(spec.arch_token(), "arm64");
/// assert_eq!(spec.title_os_token(), "Darwin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSpec {
    os_token: &'static str,
    arch_token: &'static str,
}

impl PlatformSpec {
    /// Resolve raw identifiers into release tokens.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnsupportedPlatform`] when the OS is not in
    /// the table, or [`InstallerError::UnsupportedArchitecture`] when the
    /// architecture is not.
    pub fn resolve(host: &HostIdentity) -> Result<Self> {
        let os_token =
            lookup(OS_TOKENS, &host.os).ok_or_else(|| InstallerError::UnsupportedPlatform {
                os: host.os.clone(),
            })?;
        let arch_token = lookup(ARCH_TOKENS, &host.arch).ok_or_else(|| {
            InstallerError::UnsupportedArchitecture {
                arch: host.arch.clone(),
            }
        })?;
        Ok(Self {
            os_token,
            arch_token,
        })
    }

    /// Lowercase OS token, for example `linux`.
    #[must_use]
    pub fn os_token(&self) -> &'static str {
        self.os_token
    }

    /// Architecture token, for example `x86_64`.
    #[must_use]
    pub fn arch_token(&self) -> &'static str {
        self.arch_token
    }

    /// OS token with its first letter upper-cased, as GoReleaser emits it.
    #[must_use]
    pub fn title_os_token(&self) -> String {
        let mut chars = self.os_token.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }

    /// Whether the resolved platform is Windows.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os_token == "windows"
    }

    /// Suffix appended to executable file names on this platform.
    #[must_use]
    pub fn executable_suffix(&self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }
}

impl fmt::Display for PlatformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os_token, self.arch_token)
    }
}

fn lookup(table: &[(&str, &'static str)], raw: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(key, _)| *key == raw)
        .map(|(_, token)| *token)
}
