//! Child process environment for restic.
//!
//! restic runs with a cleared environment, so everything it needs is built
//! here: the repository credentials, plus the path and temp-directory
//! variables it uses to find helper binaries and scratch space. Which of
//! those apply depends on the host [`Platform`].

use std::collections::BTreeMap;

use restic_config::ResticConfig;
use tracing::debug;

/// Variable restic reads the repository location from.
pub const REPOSITORY_VAR: &str = "RESTIC_REPOSITORY";

/// Variable restic reads the repository password from.
pub const PASSWORD_VAR: &str = "RESTIC_PASSWORD";

/// Host variable whose presence marks a Termux sandbox.
pub const SANDBOX_MARKER: &str = "PREFIX";

const WINDOWS_DEFAULTS: &[(&str, &str)] = &[
    ("PATH", ""),
    ("LOCALAPPDATA", "~/AppData/Local"),
    ("TMP", "~/AppData/Local/Temp"),
    ("TEMP", "~/AppData/Local/Temp"),
];

const SANDBOX_DEFAULTS: &[(&str, &str)] = &[
    ("PATH", "/data/data/com.termux/files/usr/bin"),
    ("TMPDIR", "/data/data/com.termux/files/usr/tmp"),
];

const UNIX_DEFAULTS: &[(&str, &str)] = &[
    ("PATH", "/usr/local/bin:/usr/bin:/bin"),
    ("TMPDIR", "/tmp"),
];

/// Host platform classes that need different child environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Windows.
    Windows,
    /// Linux, macOS and the BSDs.
    UnixLike,
    /// Termux on Android.
    Sandboxed,
    /// Anything else; only credentials are passed.
    Unknown,
}

impl Platform {
    /// Detect the platform of the running process.
    pub fn detect() -> Self {
        Self::detect_with(std::env::consts::OS, host_var)
    }

    /// Classify `os` (a [`std::env::consts::OS`] value), reading host
    /// variables through `host`.
    ///
    /// Windows wins over the sandbox marker; the marker wins over the
    /// generic Unix classification.
    pub fn detect_with<F>(os: &str, host: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let platform = if os == "windows" {
            Self::Windows
        } else if host(SANDBOX_MARKER).is_some_and(|v| !v.is_empty()) {
            Self::Sandboxed
        } else if matches!(
            os,
            "linux" | "macos" | "freebsd" | "netbsd" | "openbsd" | "dragonfly"
        ) {
            Self::UnixLike
        } else {
            Self::Unknown
        };
        debug!(os, ?platform, "detected host platform");
        platform
    }

    /// Host variables forwarded on this platform, with fallbacks for when
    /// the host does not set them.
    pub fn forwarded_vars(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Windows => WINDOWS_DEFAULTS,
            Self::Sandboxed => SANDBOX_DEFAULTS,
            Self::UnixLike => UNIX_DEFAULTS,
            Self::Unknown => &[],
        }
    }
}

/// Reads a variable from the real process environment.
pub fn host_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Build the environment for one restic invocation.
///
/// Layers, lowest precedence first: credentials, platform variables (host
/// value or fallback), `config.env`, then `overrides`.
pub fn build_env<F>(
    config: &ResticConfig,
    platform: Platform,
    host: F,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = BTreeMap::new();
    env.insert(REPOSITORY_VAR.to_string(), config.repository.clone());
    env.insert(PASSWORD_VAR.to_string(), config.password.clone());

    for (key, fallback) in platform.forwarded_vars() {
        let value = host(*key).unwrap_or_else(|| (*fallback).to_string());
        env.insert((*key).to_string(), value);
    }

    env.extend(config.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    env.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    env
}
