//! Precondition checks run once before a wrapper is constructed.

use std::path::PathBuf;

use restic_core::{ResticError, Result};
use tracing::debug;

use crate::config::ResticConfig;

/// Validate `config` and resolve its executable.
///
/// Checks, in order, that the executable can be found (a bare name is looked
/// up on `PATH`, anything containing a path separator is checked directly),
/// that the repository is set, that the password is set, and that a
/// configured timeout is a positive number of seconds.
///
/// Returns the absolute path of the executable that should be spawned.
///
/// # Errors
///
/// Every failure, including lookup errors other than "not found", is a
/// [`ResticError::Config`].
pub fn validate(config: &ResticConfig) -> Result<PathBuf> {
    if config.path.trim().is_empty() {
        return Err(ResticError::config("restic executable path is empty"));
    }

    let executable = which::which(&config.path).map_err(|e| {
        ResticError::config(format!(
            "restic executable '{}' does not exist: {e}",
            config.path
        ))
    })?;

    if config.repository.is_empty() {
        return Err(ResticError::config("restic repository is not set"));
    }
    if config.password.is_empty() {
        return Err(ResticError::config("restic password is not set"));
    }
    if let Some(secs) = config.timeout {
        if config.default_timeout().is_none() {
            return Err(ResticError::config(format!(
                "restic timeout must be a positive number of seconds, got {secs}"
            )));
        }
    }

    debug!(executable = %executable.display(), repository = %config.repository, "restic config is valid");
    Ok(executable)
}
