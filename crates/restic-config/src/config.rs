//! Configuration types and loading for the restic wrapper.
//!
//! The main entry point is [`ResticConfig`]. It can be built directly or
//! loaded with [`load_config`], which layers defaults, an optional YAML or
//! TOML file and `RESTIC_WRAPPER_*` environment variables.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use restic_core::{ResticError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default executable name, resolved through `PATH`.
pub const DEFAULT_EXECUTABLE: &str = "restic";

/// Prefix of the environment variables read by [`load_config`].
pub const ENV_PREFIX: &str = "RESTIC_WRAPPER_";

/// Placeholder shown instead of the password.
const REDACTED: &str = "********";

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// Everything needed to drive one restic repository.
///
/// The password is never printed: the `Debug` impl redacts it and
/// [`ResticConfig::redacted`] produces a copy that is safe to display.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ResticConfig {
    /// Repository location (`/srv/backup`, `s3:host/bucket`, `sftp:...`).
    #[serde(default)]
    pub repository: String,

    /// Repository password.
    #[serde(default)]
    pub password: String,

    /// File to read the password from when `password` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_file: Option<PathBuf>,

    /// Path to the restic executable, or a bare name looked up on `PATH`.
    #[serde(default = "default_path")]
    pub path: String,

    /// Extra variables for every child process (backend credentials etc.).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Default timeout in seconds for invocations that don't set one.
    /// Fractions are allowed (`0.5`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
}

fn default_path() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

impl Default for ResticConfig {
    fn default() -> Self {
        Self {
            repository: String::new(),
            password: String::new(),
            password_file: None,
            path: default_path(),
            env: BTreeMap::new(),
            timeout: None,
        }
    }
}

impl fmt::Debug for ResticConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResticConfig")
            .field("repository", &self.repository)
            .field("password", &REDACTED)
            .field("password_file", &self.password_file)
            .field("path", &self.path)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ResticConfig {
    /// Creates a config for `repository` with the default executable.
    pub fn new(repository: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Sets the restic executable path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Adds an extra environment variable for every child process.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the default per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.as_secs_f64());
        self
    }

    /// Returns the default per-call timeout, if configured.
    ///
    /// A value that is not a positive number of seconds yields `None`;
    /// [`crate::validate`] rejects such configs.
    pub fn default_timeout(&self) -> Option<Duration> {
        self.timeout
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Returns a copy with the password (and extra env values) masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.password.is_empty() {
            copy.password = REDACTED.to_string();
        }
        for value in copy.env.values_mut() {
            *value = REDACTED.to_string();
        }
        copy
    }

    /// Fills `password` from `password_file` when the password is empty.
    ///
    /// A single trailing line ending is stripped from the file contents.
    ///
    /// # Errors
    ///
    /// Returns a config error if the file cannot be read.
    pub fn resolve_password(&mut self) -> Result<()> {
        if !self.password.is_empty() {
            return Ok(());
        }
        let Some(file) = &self.password_file else {
            return Ok(());
        };

        let content = std::fs::read_to_string(file).map_err(|e| {
            ResticError::config(format!(
                "failed to read password file '{}': {e}",
                file.display()
            ))
        })?;
        let password = content
            .strip_suffix('\n')
            .map(|s| s.strip_suffix('\r').unwrap_or(s))
            .unwrap_or(&content);
        self.password = password.to_string();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load configuration from defaults, an optional file, and the environment.
///
/// Files ending in `.toml` are read as TOML, anything else as YAML.
/// Environment variables use the [`ENV_PREFIX`] prefix, e.g.
/// `RESTIC_WRAPPER_REPOSITORY` or `RESTIC_WRAPPER_PASSWORD_FILE`.
///
/// The result is not validated; see [`crate::validate`].
///
/// # Errors
///
/// Returns a config error if the file is missing or malformed, or if the
/// password file cannot be read.
pub fn load_config(file: Option<&Path>) -> Result<ResticConfig> {
    load_config_with_env(file, ENV_PREFIX)
}

/// Like [`load_config`] but reading environment variables with `env_prefix`.
pub fn load_config_with_env(file: Option<&Path>, env_prefix: &str) -> Result<ResticConfig> {
    let mut figment = Figment::from(Serialized::defaults(ResticConfig::default()));

    if let Some(file) = file {
        if !file.is_file() {
            return Err(ResticError::config(format!(
                "config file '{}' does not exist",
                file.display()
            )));
        }
        debug!(path = %file.display(), "loading config file");
        figment = match file.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => figment.merge(Toml::file(file)),
            _ => figment.merge(Yaml::file(file)),
        };
    }

    figment = figment.merge(Env::prefixed(env_prefix).ignore(&["env"]));

    let mut config: ResticConfig = figment
        .extract()
        .map_err(|e| ResticError::config(format!("invalid configuration: {e}")))?;
    config.resolve_password()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
