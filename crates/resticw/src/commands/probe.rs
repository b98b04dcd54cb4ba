//! `resticw probe` -- check that the repository is usable.

use anyhow::Result;
use restic_exec::Restic;

use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `resticw probe` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let restic = Restic::new(ctx.config.clone(), false)?;
    report_ready(ctx, &restic);
    Ok(())
}

/// Print that `restic`'s repository is ready.
pub(crate) fn report_ready(ctx: &RuntimeContext, restic: &Restic) {
    if ctx.json {
        output_json(&serde_json::json!({
            "repository": restic.config().repository,
            "executable": restic.executable().display().to_string(),
            "ready": true,
        }));
    } else {
        println!("repository {} is ready", restic.config().repository);
    }
}
