//! Clap CLI definitions for the `resticw` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// resticw -- run restic with typed errors.
///
/// Validates the configuration, checks the repository once, and then runs
/// restic with `--json`, mapping its exit codes to error kinds.
#[derive(Parser, Debug)]
#[command(
    name = "resticw",
    about = "Run restic with validated config and typed errors",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
///
/// The password is deliberately not a flag: it comes from `RESTIC_PASSWORD`,
/// `--password-file`, or the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (YAML, or TOML with a `.toml` extension).
    #[arg(long, global = true, env = "RESTICW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Repository location.
    #[arg(short = 'r', long, global = true, env = "RESTIC_REPOSITORY")]
    pub repo: Option<String>,

    /// File containing the repository password.
    #[arg(long, global = true, env = "RESTIC_PASSWORD_FILE")]
    pub password_file: Option<PathBuf>,

    /// Path to the restic executable (default: `restic` on PATH).
    #[arg(long, global = true)]
    pub restic_path: Option<String>,

    /// Kill restic if a call runs longer than this many seconds.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Output in JSON format (including errors).
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the repository exists and the password is accepted.
    Probe,

    /// Create the repository if it does not exist yet.
    Init,

    /// Run any restic command and print its JSON output.
    Exec(ExecArgs),

    /// Show the resolved configuration (password redacted).
    Config,

    /// Print version information.
    Version,

    /// Generate shell completions.
    Completion(CompletionArgs),
}

/// Arguments for `resticw exec`.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Initialize the repository first if it does not exist.
    #[arg(long)]
    pub auto_init: bool,

    /// The restic subcommand (e.g. `snapshots`, `backup`).
    pub command: String,

    /// Arguments passed to the restic subcommand.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for `resticw completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

/// Completion subcommands.
#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Generate Bash completions.
    Bash,
    /// Generate Zsh completions.
    Zsh,
    /// Generate Fish completions.
    Fish,
    /// Generate PowerShell completions.
    Powershell,
}
