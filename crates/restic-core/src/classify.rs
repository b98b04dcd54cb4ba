//! Translation of restic exit codes into [`ResticError`]s.
//!
//! The exit codes are restic's documented scripting contract
//! (<https://restic.readthedocs.io/en/latest/075_scripting.html#exit-codes>).
//! Automated retry and alerting logic downstream keys off the kind chosen
//! here, so [`EXIT_CODES`] must stay exact.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::{ErrorKind, ResticError};

/// One row of the exit-code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodeEntry {
    /// The process exit code.
    pub code: i32,
    /// Human-readable description used as the base of the error message.
    pub description: &'static str,
    /// The error kind raised for this code.
    pub kind: ErrorKind,
}

/// Every exit code restic documents.
pub const EXIT_CODES: &[ExitCodeEntry] = &[
    ExitCodeEntry {
        code: 1,
        description: "command failed",
        kind: ErrorKind::Command,
    },
    ExitCodeEntry {
        code: 2,
        description: "Go runtime error",
        kind: ErrorKind::Runtime,
    },
    ExitCodeEntry {
        code: 3,
        description: "command failed",
        kind: ErrorKind::Command,
    },
    // Codes 10-12 exist since restic 0.17.
    ExitCodeEntry {
        code: 10,
        description: "repository does not exist",
        kind: ErrorKind::Repository,
    },
    ExitCodeEntry {
        code: 11,
        description: "failed to lock repository",
        kind: ErrorKind::Repository,
    },
    ExitCodeEntry {
        code: 12,
        description: "wrong password",
        kind: ErrorKind::Password,
    },
    ExitCodeEntry {
        code: 130,
        description: "command was interrupted",
        kind: ErrorKind::Command,
    },
];

/// Description used for codes missing from [`EXIT_CODES`].
pub const UNEXPECTED_ERROR: &str = "unexpected error";

/// Detail used when a structured payload parses but has no `message`.
const UNKNOWN_DETAIL: &str = "unknown error";

/// Looks up `code` in [`EXIT_CODES`].
pub fn lookup(code: i32) -> Option<&'static ExitCodeEntry> {
    EXIT_CODES.iter().find(|entry| entry.code == code)
}

/// The structured error restic writes to stderr in `--json` mode.
///
/// Only `message` feeds into the composed error; the other fields are kept
/// for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorPayload {
    /// Payload type, `"exit_error"` for fatal errors.
    #[serde(default)]
    pub message_type: Option<String>,
    /// The exit code restic reports in the payload.
    #[serde(default)]
    pub code: Option<i32>,
    /// The error message. Kept as raw JSON so an odd type still parses.
    #[serde(default)]
    pub message: Option<Value>,
}

impl ErrorPayload {
    /// The message as text: strings as-is, other JSON values in their JSON
    /// form, `None` when missing or `null`.
    pub fn message_text(&self) -> Option<String> {
        match self.message.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Best-effort parse of restic's stderr as an [`ErrorPayload`].
///
/// The whole (trimmed) text is tried first, then its last non-empty line,
/// since restic may print plain warnings before the final JSON error.
/// Returns `None` when neither parses; callers fall back to the raw text.
pub fn parse_error_payload(stderr: &str) -> Option<ErrorPayload> {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<ErrorPayload>(trimmed) {
        Ok(payload) => return Some(payload),
        Err(e) => debug!(error = %e, "stderr is not a single JSON payload"),
    }

    let last_line = trimmed.lines().rev().map(str::trim).find(|l| !l.is_empty())?;
    if last_line.len() == trimmed.len() {
        return None;
    }
    serde_json::from_str::<ErrorPayload>(last_line).ok()
}

/// Classifies a failed restic invocation.
///
/// `command` is the restic subcommand (used in the message), `exit_code` the
/// non-zero exit code, `stderr` the captured standard error. The returned
/// error carries `execution of <command> failed: <description>` followed by
/// `, error message: <detail>` when stderr is not blank. Whitespace-only
/// stderr appends nothing.
pub fn classify(command: &str, exit_code: i32, stderr: &str) -> ResticError {
    let entry = lookup(exit_code);
    let description = entry.map_or(UNEXPECTED_ERROR, |e| e.description);
    let kind = entry.map_or(ErrorKind::Command, |e| e.kind);

    let mut message = format!("execution of {command} failed: {description}");

    let raw = stderr.trim();
    let detail = if raw.is_empty() {
        None
    } else {
        match parse_error_payload(raw) {
            Some(payload) => {
                debug!(?payload, "parsed structured error payload");
                Some(payload.message_text().unwrap_or_else(|| UNKNOWN_DETAIL.to_string()))
            }
            None => {
                warn!("stderr is not a structured payload, using raw text");
                Some(raw.to_string())
            }
        }
    };

    if let Some(detail) = &detail {
        message.push_str(", error message: ");
        message.push_str(detail);
    }

    error!(command, exit_code, kind = %kind, "{message}");

    ResticError::from_kind(kind, message, Some(exit_code), detail)
}
