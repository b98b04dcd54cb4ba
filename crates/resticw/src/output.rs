//! Output formatting helpers for the `resticw` CLI.

use std::io::{self, Write};

use restic_core::ResticError;
use serde::Serialize;

/// Print a value as pretty JSON to stdout.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print restic's raw output unchanged.
pub fn output_raw(text: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = handle.write_all(text.as_bytes());
    let _ = handle.flush();
}

/// Build the JSON object printed for a failed command.
pub fn error_json(err: &anyhow::Error) -> serde_json::Value {
    match err.downcast_ref::<ResticError>() {
        Some(restic) => serde_json::json!({
            "error": format!("{:#}", err),
            "kind": restic.kind(),
            "exit_code": restic.exit_code(),
            "detail": restic.detail(),
        }),
        None => serde_json::json!({
            "error": format!("{:#}", err),
        }),
    }
}

/// The process exit status for a failed command: restic's own exit code
/// when there is one, otherwise 1.
pub fn exit_status(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ResticError>()
        .and_then(ResticError::exit_code)
        .filter(|code| *code > 0 && *code < 256)
        .unwrap_or(1)
}
