//! Command handlers for the `resticw` CLI.

pub mod completion;
pub mod config_cmd;
pub mod exec;
pub mod init;
pub mod probe;
pub mod version;
