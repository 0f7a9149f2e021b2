//! openpilot installer library.
//!
//! This crate downloads the prebuilt openpilot binary for the host platform
//! from a GitHub-style release feed, extracts it, and installs it beside the
//! installer. It backs the `openpilot-install` and `openpilot-launch`
//! binaries and can be driven programmatically with injected transports for
//! testing.
//!
//! # Modules
//!
//! - [`candidates`] - Release asset name and URL generation
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Resolved installer configuration
//! - [`download`] - Sequential candidate download over HTTP
//! - [`error`] - Semantic error types
//! - [`executor`] - External command execution
//! - [`extraction`] - Archive extraction via platform tools
//! - [`fallback`] - Download rounds with bundled-version fallback
//! - [`install`] - End-to-end installation pipeline
//! - [`launcher`] - Forwarding execution to the installed binary
//! - [`locator`] - Finding the binary in an extracted tree
//! - [`metadata`] - Bundled package version lookup
//! - [`output`] - Progress output and logging setup
//! - [`platform`] - Host OS and architecture token mapping

pub mod candidates;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod executor;
pub mod extraction;
pub mod fallback;
pub mod install;
pub mod launcher;
pub mod locator;
pub mod metadata;
pub mod output;
pub mod platform;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
