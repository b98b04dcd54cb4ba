//! restic process execution for the wrapper.
//!
//! This crate builds the child environment, spawns restic with a timeout,
//! and owns the repository lifecycle ([`Restic`]): validate, probe, and
//! optionally initialize the repository once at construction.

pub mod env;
pub mod executor;
pub mod lifecycle;

pub use env::{Platform, build_env};
pub use executor::{Executor, Invocation, ProcessExecutor};
pub use lifecycle::Restic;
