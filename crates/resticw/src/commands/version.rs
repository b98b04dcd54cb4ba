//! `resticw version` -- print version and platform.

use anyhow::Result;
use restic_exec::Platform;

use crate::output::output_json;

/// Version string. Set at compile time via Cargo.toml (workspace version).
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Execute the `resticw version` command.
///
/// Takes the `--json` flag directly so it works without a usable config.
pub fn run(json: bool) -> Result<()> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    let platform = format!("{:?}", Platform::detect());

    if json {
        let info = serde_json::json!({
            "version": VERSION,
            "os": os,
            "arch": arch,
            "platform": platform,
        });
        output_json(&info);
    } else {
        println!("resticw version {} {}/{} ({})", VERSION, os, arch, platform);
    }

    Ok(())
}
