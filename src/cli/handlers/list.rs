use crate::cli::commands::{PriorityArg, StatusArg};
use crate::model::Priority;
use anyhow::Result;

use super::CommandContext;
use super::utils::print_problem_list;

pub fn handle_list(
    ctx: &CommandContext,
    status: Option<StatusArg>,
    priority: Option<PriorityArg>,
    json: bool,
) -> Result<()> {
    let mut problems = ctx
        .orchestrator
        .store()
        .get_problems(status.map(Into::into))?;

    if let Some(p) = priority {
        let filter_priority: Priority = p.into();
        problems.retain(|problem| problem.priority == filter_priority);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&problems)?);
    } else {
        print_problem_list(&problems);
    }
    Ok(())
}
