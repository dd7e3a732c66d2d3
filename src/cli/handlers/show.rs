use anyhow::Result;

use super::CommandContext;
use super::utils::{print_problem, print_sessions};

pub fn handle_show(ctx: &CommandContext, id: String, json: bool) -> Result<()> {
    let store = ctx.orchestrator.store();
    let problem = store.get_problem(&id)?;
    let sessions = store.sessions_for(&id)?;

    if json {
        let value = serde_json::json!({
            "problem": problem,
            "sessions": sessions,
            "chat_log": store.chat_logs_for(&id)?,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_problem(&problem);
        print_sessions(&sessions);
    }
    Ok(())
}
