//! Configuration management for the restic wrapper.
//!
//! This crate defines [`ResticConfig`](config::ResticConfig), loads it from
//! layered sources with figment, and validates it before any restic process
//! is spawned.

pub mod config;
pub mod validate;

pub use config::{ResticConfig, load_config};
pub use validate::validate;
