// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [gftp]
/// binary = "/opt/golem/gftp"
/// gsb_url = "tcp://127.0.0.1:7464"
///
/// [timeouts]
/// shutdown_grace = "5s"
/// publish = "60s"
/// download = "30m"
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub gftp: GftpSection,

    #[serde(default)]
    pub timeouts: RawTimeouts,
}

/// `[gftp]` section.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GftpSection {
    /// Path to the gftp executable.
    ///
    /// If `None`, `GFTP_BIN` and then `PATH` are consulted.
    #[serde(default)]
    pub binary: Option<PathBuf>,

    /// Value exported as `GSB_URL` to every gftp process.
    #[serde(default)]
    pub gsb_url: Option<String>,
}

/// `[timeouts]` section with durations still as strings (`"3s"`, `"250ms"`).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawTimeouts {
    #[serde(default)]
    pub shutdown_grace: Option<String>,
    #[serde(default)]
    pub publish: Option<String>,
    #[serde(default)]
    pub download: Option<String>,
}

/// Validated configuration.
///
/// Only constructible via `TryFrom<RawConfigFile>` (or [`ConfigFile::default`]),
/// so every `ConfigFile` holds parsed durations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub gftp: GftpSection,
    pub timeouts: Timeouts,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(gftp: GftpSection, timeouts: Timeouts) -> Self {
        Self { gftp, timeouts }
    }
}

pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Bounds on how long the API waits for gftp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Time between the interrupt sent by unpublish and a forced kill.
    pub shutdown_grace: Duration,

    /// Bound on waiting for a publish URL; `None` waits forever.
    pub publish: Option<Duration>,

    /// Bound on wait-for-download; `None` waits forever.
    pub download: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            publish: None,
            download: None,
        }
    }
}
