//! Core types for the restic wrapper.
//!
//! This crate holds the error taxonomy shared by every other crate and the
//! classifier that turns a restic exit code plus its stderr into one of
//! those errors.

pub mod classify;
pub mod error;

pub use classify::{EXIT_CODES, ExitCodeEntry, classify};
pub use error::{ErrorKind, ResticError, Result};
