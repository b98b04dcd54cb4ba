//! `resticw exec` -- run a restic command and print its output.

use anyhow::Result;
use restic_exec::{Invocation, Restic};

use crate::cli::ExecArgs;
use crate::context::RuntimeContext;
use crate::output::output_raw;

/// Execute the `resticw exec` command.
///
/// restic already prints JSON (`--json` is always passed), so stdout is
/// forwarded unchanged regardless of the global `--json` flag.
pub fn run(ctx: &RuntimeContext, args: &ExecArgs) -> Result<()> {
    let restic = Restic::new(ctx.config.clone(), args.auto_init)?;
    let invocation = Invocation::new(&args.command).args(&args.args);
    let output = restic.exec(&invocation)?;
    output_raw(&output);
    Ok(())
}
