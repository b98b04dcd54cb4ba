//! restic subprocess execution.
//!
//! [`ProcessExecutor`] spawns `restic <command> [args...] --json` with an
//! environment from [`build_env`](crate::env::build_env), waits for it with
//! an optional timeout, and turns non-zero exits into classified errors.
//! The [`Executor`] trait lets the lifecycle run against a substitute.

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use restic_config::ResticConfig;
use restic_core::classify::{UNEXPECTED_ERROR, classify};
use restic_core::{ResticError, Result};
use tracing::{debug, error};

use crate::env::{Platform, build_env, host_var};

/// Flag appended to every invocation.
pub const JSON_FLAG: &str = "--json";

/// How often a child with a deadline is polled.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// One restic call: subcommand, extra arguments, env overrides and timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// The restic subcommand (`backup`, `snapshots`, ...).
    pub command: String,
    /// Arguments following the subcommand.
    pub args: Vec<String>,
    /// Variables that override everything else in the child environment.
    pub env: BTreeMap<String, String>,
    /// Kill the child if it runs longer than this.
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Creates an invocation of `command` without arguments.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment override.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The argument vector after the executable: command, args, `--json`.
    pub fn argv(&self) -> Vec<&str> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        argv.push(self.command.as_str());
        argv.extend(self.args.iter().map(String::as_str));
        argv.push(JSON_FLAG);
        argv
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Runs restic invocations.
///
/// Implementations return stdout on success and a classified
/// [`ResticError`] otherwise.
pub trait Executor {
    /// Run `invocation` to completion.
    fn execute(&self, invocation: &Invocation) -> Result<String>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, invocation: &Invocation) -> Result<String> {
        (**self).execute(invocation)
    }
}

/// Runs restic as a child process.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    executable: PathBuf,
    config: ResticConfig,
    platform: Platform,
}

impl ProcessExecutor {
    /// Creates an executor spawning `executable` for the repository in
    /// `config`. The executable should already be validated.
    pub fn new(executable: impl Into<PathBuf>, config: ResticConfig, platform: Platform) -> Self {
        Self {
            executable: executable.into(),
            config,
            platform,
        }
    }

    /// The executable this executor spawns.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// The platform whose environment table the child gets.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn spawn(&self, invocation: &Invocation) -> io::Result<Child> {
        let env = build_env(&self.config, self.platform, host_var, &invocation.env);
        let argv = invocation.argv();

        debug!(
            executable = %self.executable.display(),
            args = %argv.join(" "),
            env = ?env.keys().collect::<Vec<_>>(),
            "running restic"
        );

        Command::new(&self.executable)
            .args(&argv)
            .env_clear()
            .envs(&env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
    }
}

impl Executor for ProcessExecutor {
    /// The timeout covers the whole call: the child's exit and the end of
    /// its output. A helper that inherits restic's pipes and outlives it
    /// therefore counts against the deadline too.
    fn execute(&self, invocation: &Invocation) -> Result<String> {
        let command = invocation.command.as_str();
        let timeout = invocation
            .timeout
            .or_else(|| self.config.default_timeout());

        let mut child = self.spawn(invocation).map_err(|e| {
            let message = format!("execution of {command} failed: {e}");
            error!("{message}");
            ResticError::command(message)
        })?;
        let deadline = timeout.and_then(|limit| Instant::now().checked_add(limit));

        let stdout = drain(child.stdout.take(), "stdout");
        let stderr = drain(child.stderr.take(), "stderr");

        let status = match deadline {
            Some(deadline) => wait_with_deadline(&mut child, deadline),
            None => child.wait().map(Some),
        };

        let status = match status {
            Ok(Some(status)) => status,
            Ok(None) => return Err(timed_out(&mut child, command, timeout)),
            Err(e) => {
                terminate(&mut child);
                let message = format!("execution of {command} failed: {e}");
                error!("{message}");
                return Err(ResticError::command(message));
            }
        };

        let (Some(stdout), Some(stderr)) = (collect(stdout, deadline), collect(stderr, deadline))
        else {
            return Err(timed_out(&mut child, command, timeout));
        };
        debug!(command, code = ?status.code(), "restic finished");

        match status.code() {
            Some(0) => {
                if !stderr.trim().is_empty() {
                    debug!(command, stderr = %stderr.trim(), "restic wrote to stderr on success");
                }
                Ok(stdout)
            }
            Some(code) => Err(classify(command, code, &stderr)),
            None => {
                let message = format!("execution of {command} failed: {UNEXPECTED_ERROR} ({})", describe(status));
                error!("{message}");
                Err(ResticError::command(message))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Read a child pipe to the end on a background thread.
///
/// The buffer is sent once the pipe closes, which happens only after every
/// process holding its write end has exited.
fn drain<R>(pipe: Option<R>, name: &'static str) -> Option<Receiver<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = pipe.read_to_end(&mut buf) {
                debug!(pipe = name, error = %e, read = buf.len(), "failed to read restic output");
            }
            let _ = tx.send(buf);
        });
        rx
    })
}

/// Wait for a drained pipe. `None` means `deadline` passed first.
fn collect(pipe: Option<Receiver<Vec<u8>>>, deadline: Option<Instant>) -> Option<String> {
    let Some(pipe) = pipe else {
        return Some(String::new());
    };
    let received = match deadline {
        Some(deadline) => pipe.recv_timeout(deadline.saturating_duration_since(Instant::now())),
        None => pipe.recv().map_err(|_| RecvTimeoutError::Disconnected),
    };
    match received {
        Ok(buf) => Some(String::from_utf8_lossy(&buf).into_owned()),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

/// Wait for `child`, returning `Ok(None)` if `deadline` passes first.
fn wait_with_deadline(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

/// Kill `child` after its deadline and build the timeout error.
fn timed_out(child: &mut Child, command: &str, timeout: Option<Duration>) -> ResticError {
    terminate(child);
    let message = format!("execution of {command} timed out");
    error!(?timeout, "{message}");
    ResticError::command(message)
}

/// Kill and reap `child`. The pipe readers are left to finish on their own.
fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "failed to kill restic");
    }
    if let Err(e) = child.wait() {
        debug!(error = %e, "failed to reap restic");
    }
}

#[cfg(unix)]
fn describe(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => format!("terminated by signal {signal}"),
        None => status.to_string(),
    }
}

#[cfg(not(unix))]
fn describe(status: ExitStatus) -> String {
    status.to_string()
}
