//! Error types for the restic wrapper.
//!
//! Every failure the wrapper can produce is one [`ResticError`]. The variants
//! form a flat taxonomy with a single specialization: a [`ResticError::Password`]
//! is also a repository error (see [`ResticError::is_repository_error`]).

use serde::Serialize;
use thiserror::Error;

/// The kind of a [`ResticError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Generic restic failure (Go runtime error, exit code 2).
    Runtime,
    /// Configuration precondition failure, raised at construction only.
    Config,
    /// Repository missing or locked.
    Repository,
    /// Repository password rejected.
    Password,
    /// Process-level failure: timeout, spawn failure, unrecognized exit code.
    Command,
}

impl ErrorKind {
    /// Returns the kebab-case name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::Config => "config",
            Self::Repository => "repository",
            Self::Password => "password",
            Self::Command => "command",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while driving restic.
#[derive(Debug, Error)]
pub enum ResticError {
    /// The configuration is unusable (missing executable, repository or password).
    #[error("{message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// The repository does not exist or could not be locked.
    #[error("{message}")]
    Repository {
        /// Composed message (base description plus upstream detail).
        message: String,
        /// The restic exit code.
        exit_code: Option<i32>,
        /// The `message` field of restic's structured error, if any.
        detail: Option<String>,
    },

    /// The repository rejected the password.
    #[error("{message}")]
    Password {
        /// Composed message (base description plus upstream detail).
        message: String,
        /// The restic exit code.
        exit_code: Option<i32>,
        /// The `message` field of restic's structured error, if any.
        detail: Option<String>,
    },

    /// The process timed out, could not be started, or failed with an
    /// exit code not covered by a more specific kind.
    #[error("{message}")]
    Command {
        /// Composed message.
        message: String,
        /// The restic exit code, or `None` if the process never produced one.
        exit_code: Option<i32>,
        /// The `message` field of restic's structured error, if any.
        detail: Option<String>,
    },

    /// restic itself crashed (Go runtime error).
    #[error("{message}")]
    Runtime {
        /// Composed message.
        message: String,
        /// The restic exit code.
        exit_code: Option<i32>,
        /// The `message` field of restic's structured error, if any.
        detail: Option<String>,
    },
}

/// Convenience alias used throughout the wrapper crates.
pub type Result<T> = std::result::Result<T, ResticError>;

impl ResticError {
    // -- Constructors --------------------------------------------------------

    /// Creates a [`ResticError::Config`] with the given message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a [`ResticError::Command`] that did not come from an exit code.
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
            exit_code: None,
            detail: None,
        }
    }

    /// Builds the variant matching `kind`.
    ///
    /// A [`ErrorKind::Config`] kind ignores `exit_code` and `detail`.
    pub fn from_kind(
        kind: ErrorKind,
        message: impl Into<String>,
        exit_code: Option<i32>,
        detail: Option<String>,
    ) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Config => Self::Config { message },
            ErrorKind::Repository => Self::Repository {
                message,
                exit_code,
                detail,
            },
            ErrorKind::Password => Self::Password {
                message,
                exit_code,
                detail,
            },
            ErrorKind::Command => Self::Command {
                message,
                exit_code,
                detail,
            },
            ErrorKind::Runtime => Self::Runtime {
                message,
                exit_code,
                detail,
            },
        }
    }

    // -- Accessors -----------------------------------------------------------

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Repository { .. } => ErrorKind::Repository,
            Self::Password { .. } => ErrorKind::Password,
            Self::Command { .. } => ErrorKind::Command,
            Self::Runtime { .. } => ErrorKind::Runtime,
        }
    }

    /// Returns the composed, human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Self::Config { message }
            | Self::Repository { message, .. }
            | Self::Password { message, .. }
            | Self::Command { message, .. }
            | Self::Runtime { message, .. } => message,
        }
    }

    /// Returns the restic exit code that produced this error, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Config { .. } => None,
            Self::Repository { exit_code, .. }
            | Self::Password { exit_code, .. }
            | Self::Command { exit_code, .. }
            | Self::Runtime { exit_code, .. } => *exit_code,
        }
    }

    /// Returns the upstream message parsed from restic's stderr, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Config { .. } => None,
            Self::Repository { detail, .. }
            | Self::Password { detail, .. }
            | Self::Command { detail, .. }
            | Self::Runtime { detail, .. } => detail.as_deref(),
        }
    }

    // -- Predicates ----------------------------------------------------------

    /// Returns `true` for repository errors, including password errors.
    pub fn is_repository_error(&self) -> bool {
        matches!(self, Self::Repository { .. } | Self::Password { .. })
    }

    /// Returns `true` if this is a [`ResticError::Password`].
    pub fn is_password_error(&self) -> bool {
        matches!(self, Self::Password { .. })
    }
}
