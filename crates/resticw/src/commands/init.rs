//! `resticw init` -- create the repository unless it already exists.

use anyhow::Result;
use restic_exec::Restic;

use crate::commands::probe::report_ready;
use crate::context::RuntimeContext;

/// Execute the `resticw init` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let restic = Restic::new(ctx.config.clone(), true)?;
    report_ready(ctx, &restic);
    Ok(())
}
