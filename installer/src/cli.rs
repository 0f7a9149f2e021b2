//! CLI argument definitions for the openpilot installer.
//!
//! Every option also reads an `OPENPILOT_*` environment variable so that a
//! package manager's post-install hook can configure the installer without
//! passing flags.

use crate::candidates::{DEFAULT_RELEASE_HOST, DEFAULT_REPO};
use camino::Utf8PathBuf;
use clap::Parser;
use clap::builder::FalseyValueParser;

/// Install the prebuilt openpilot binary for this platform.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "openpilot-install")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install the prebuilt openpilot binary for this platform.\n\n",
    "The installer maps the host OS and CPU to release naming tokens, tries a ",
    "fixed list of archive names on the release feed in order, extracts the ",
    "first one found, and copies the openpilot binary next to this installer. ",
    "If `latest` has no matching asset, the bundled package version is tried.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install the latest release:\n",
    "    $ openpilot-install\n\n",
    "  Install a pinned release:\n",
    "    $ openpilot-install --release 1.2.3\n\n",
    "  Show the candidate URLs without downloading:\n",
    "    $ openpilot-install --dry-run\n\n",
    "  Debug a failing install:\n",
    "    $ OPENPILOT_DEBUG=1 openpilot-install",
))]
pub struct Cli {
    /// Release to install: `latest` or an explicit version such as 1.2.3.
    #[arg(long, env = "OPENPILOT_VERSION", value_name = "VERSION")]
    pub release: Option<String>,

    /// Repository path on the release host.
    #[arg(long, env = "OPENPILOT_REPO", value_name = "OWNER/REPO", default_value = DEFAULT_REPO)]
    pub repo: String,

    /// Base URL of the release host.
    #[arg(
        long,
        env = "OPENPILOT_RELEASE_HOST",
        value_name = "URL",
        default_value = DEFAULT_RELEASE_HOST
    )]
    pub release_host: String,

    /// Package manifest holding the fallback version [default: embedded].
    #[arg(long, env = "OPENPILOT_METADATA", value_name = "PATH")]
    pub metadata: Option<Utf8PathBuf>,

    /// Directory receiving the binary [default: this executable's directory].
    #[arg(long, env = "OPENPILOT_BIN_DIR", value_name = "DIR")]
    pub bin_dir: Option<Utf8PathBuf>,

    /// Scratch directory for downloads [default: <bin-dir>/../dist].
    #[arg(long, env = "OPENPILOT_SCRATCH_DIR", value_name = "DIR")]
    pub scratch_dir: Option<Utf8PathBuf>,

    /// Log every candidate and failure reason.
    #[arg(long, env = "OPENPILOT_DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,

    /// Show the install target and candidate URLs and exit.
    #[arg(long)]
    pub dry_run: bool,
}
