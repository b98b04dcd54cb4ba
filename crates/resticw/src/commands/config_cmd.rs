//! `resticw config` -- show the resolved configuration.

use anyhow::{Context, Result};

use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `resticw config` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let shown = ctx.config.redacted();
    if ctx.json {
        output_json(&shown);
    } else {
        let yaml = serde_yaml::to_string(&shown).context("failed to render configuration")?;
        print!("{yaml}");
    }
    Ok(())
}
