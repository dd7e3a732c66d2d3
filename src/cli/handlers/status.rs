use anyhow::Result;

use super::CommandContext;

pub fn handle_status(ctx: &CommandContext, json: bool) -> Result<()> {
    let report = ctx.orchestrator.status_report()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}
