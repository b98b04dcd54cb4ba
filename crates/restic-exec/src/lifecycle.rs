//! Repository lifecycle: validate, probe, and optionally initialize.
//!
//! A [`Restic`] only exists once its repository has been confirmed
//! reachable. Construction validates the configuration, probes the
//! repository with `restic cat config`, and runs `restic init` when the
//! repository is missing and auto-initialization was requested. After that
//! every call is a plain pass-through to the [`Executor`].

use std::path::{Path, PathBuf};

use restic_config::{ResticConfig, validate};
use restic_core::Result;
use tracing::{error, info};

use crate::env::Platform;
use crate::executor::{Executor, Invocation, ProcessExecutor};

/// Read-only command used to probe the repository.
pub const PROBE_COMMAND: &str = "cat";

/// Argument to [`PROBE_COMMAND`]: the repository's own config object.
pub const PROBE_ARG: &str = "config";

/// Command that creates a repository.
pub const INIT_COMMAND: &str = "init";

/// A restic repository that is ready for use.
#[derive(Debug)]
pub struct Restic<E = ProcessExecutor> {
    config: ResticConfig,
    executable: PathBuf,
    executor: E,
}

impl Restic<ProcessExecutor> {
    /// Open the repository described by `config`.
    ///
    /// With `auto_init`, a missing repository is created. A rejected
    /// password is never auto-corrected.
    ///
    /// # Errors
    ///
    /// - a config error if `config` is invalid (nothing is spawned);
    /// - the probe's password error, regardless of `auto_init`;
    /// - the probe's repository error when `auto_init` is false;
    /// - whatever `restic init` fails with when `auto_init` is true;
    /// - any other probe error unchanged.
    pub fn new(config: ResticConfig, auto_init: bool) -> Result<Self> {
        let executable = validate_logged(&config)?;
        let platform = Platform::detect();
        let executor = ProcessExecutor::new(executable.clone(), config.clone(), platform);
        Self::start(config, executable, executor, auto_init)
    }

    /// The platform whose environment the executor builds for restic.
    pub fn platform(&self) -> Platform {
        self.executor.platform()
    }
}

impl<E: Executor> Restic<E> {
    /// Like [`Restic::new`] but running every command through `executor`.
    ///
    /// The configuration is still validated first.
    pub fn with_executor(config: ResticConfig, auto_init: bool, executor: E) -> Result<Self> {
        let executable = validate_logged(&config)?;
        Self::start(config, executable, executor, auto_init)
    }

    fn start(config: ResticConfig, executable: PathBuf, executor: E, auto_init: bool) -> Result<Self> {
        let restic = Self {
            config,
            executable,
            executor,
        };
        restic.ensure_repository(auto_init)?;
        Ok(restic)
    }

    fn ensure_repository(&self, auto_init: bool) -> Result<()> {
        let probe = Invocation::new(PROBE_COMMAND).arg(PROBE_ARG);
        let err = match self.exec(&probe) {
            Ok(_) => {
                info!(repository = %self.config.repository, "repository is ready");
                return Ok(());
            }
            Err(err) => err,
        };

        if err.is_password_error() || !err.is_repository_error() {
            return Err(err);
        }

        if !auto_init {
            error!(
                repository = %self.config.repository,
                "repository may not be initialized, initialize it manually"
            );
            return Err(err);
        }

        info!(repository = %self.config.repository, "repository is not initialized, initializing");
        self.exec(&Invocation::new(INIT_COMMAND))?;
        info!(repository = %self.config.repository, "repository initialized");
        Ok(())
    }

    /// Run `invocation` and return restic's stdout.
    pub fn exec(&self, invocation: &Invocation) -> Result<String> {
        self.executor.execute(invocation)
    }

    /// Run `restic <command> [args...] --json` with no overrides.
    pub fn run<I, S>(&self, command: &str, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exec(&Invocation::new(command).args(args))
    }

    /// The configuration this repository was opened with.
    pub fn config(&self) -> &ResticConfig {
        &self.config
    }

    /// The resolved restic executable.
    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

fn validate_logged(config: &ResticConfig) -> Result<PathBuf> {
    validate(config).inspect_err(|e| error!("invalid restic config: {e}"))
}
