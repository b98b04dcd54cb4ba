//! `resticw` -- run restic with validated config and typed errors.
//!
//! This is the entry point of the wrapper CLI. It parses CLI arguments with
//! clap, installs the tracing subscriber, resolves the configuration, and
//! dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;

use cli::{Cli, Commands};
use context::RuntimeContext;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // The library crates only emit events; the subscriber lives here.
    if cli.global.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("resticw=debug,restic_exec=debug,restic_config=debug,restic_core=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    // Version and completion work without a usable config; everything
    // else resolves it first.
    let load_context = || RuntimeContext::from_global_args(&cli.global);

    // Dispatch to command handler
    let result = match &cli.command {
        Some(Commands::Version) => commands::version::run(cli.global.json),
        Some(Commands::Completion(args)) => commands::completion::run(args),
        Some(Commands::Probe) => load_context().and_then(|ctx| commands::probe::run(&ctx)),
        Some(Commands::Init) => load_context().and_then(|ctx| commands::init::run(&ctx)),
        Some(Commands::Exec(args)) => load_context().and_then(|ctx| commands::exec::run(&ctx, args)),
        Some(Commands::Config) => load_context().and_then(|ctx| commands::config_cmd::run(&ctx)),
        None => {
            // No subcommand -- print help
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    // Handle errors: print message and exit with restic's code (or 1)
    if let Err(e) = result {
        if cli.global.json {
            if let Ok(s) = serde_json::to_string_pretty(&output::error_json(&e)) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(output::exit_status(&e));
    }
}
