//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds the resolved [`ResticConfig`] and the
//! global output flags every command handler needs.

use std::env;

use anyhow::{Context, Result};
use restic_config::{ResticConfig, load_config};
use tracing::debug;

use crate::cli::GlobalArgs;

/// Environment variable the password is read from.
const PASSWORD_ENV: &str = "RESTIC_PASSWORD";

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Resolved restic configuration.
    pub config: ResticConfig,

    /// Whether to produce JSON output.
    pub json: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    ///
    /// Configuration precedence, highest first: command-line flags (and
    /// their `RESTIC_*` env fallbacks), `RESTIC_PASSWORD`, `RESTIC_WRAPPER_*`
    /// variables, the config file, built-in defaults. A password file given
    /// on the command line beats `RESTIC_PASSWORD`.
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let base = load_config(global.config.as_deref()).context("failed to load configuration")?;
        let config = apply_overrides(base, global, env::var(PASSWORD_ENV).ok())?;
        debug!(repository = %config.repository, path = %config.path, "configuration resolved");

        Ok(Self {
            config,
            json: global.json,
        })
    }
}

/// Layer command-line values and the password variable over `config`.
fn apply_overrides(
    mut config: ResticConfig,
    global: &GlobalArgs,
    password_env: Option<String>,
) -> Result<ResticConfig> {
    if let Some(repo) = &global.repo {
        config.repository = repo.clone();
    }
    if let Some(path) = &global.restic_path {
        config.path = path.clone();
    }
    if let Some(timeout) = global.timeout {
        config.timeout = Some(timeout);
    }

    if let Some(file) = &global.password_file {
        config.password.clear();
        config.password_file = Some(file.clone());
        config.resolve_password()?;
    } else if let Some(password) = password_env.filter(|p| !p.is_empty()) {
        config.password = password;
    }

    Ok(config)
}
