use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use super::utils::format_status;
use crate::model::Problem;

fn report(verb: colored::ColoredString, problem: &Problem) {
    println!(
        "{} {} -> {}",
        verb,
        problem.id.cyan(),
        format_status(problem.status)
    );
}

pub fn handle_queue(ctx: &mut CommandContext, id: String) -> Result<()> {
    let problem = ctx.orchestrator.queue(&id)?;
    report("Queued".green(), &problem);
    Ok(())
}

pub fn handle_archive(ctx: &mut CommandContext, id: String) -> Result<()> {
    let problem = ctx.orchestrator.archive(&id)?;
    report("Archived".yellow(), &problem);
    Ok(())
}

pub fn handle_fail(ctx: &mut CommandContext, id: String) -> Result<()> {
    let problem = ctx.orchestrator.fail(&id)?;
    report("Failed".red(), &problem);
    Ok(())
}
