use anyhow::Result;
use colored::Colorize;

use super::CommandContext;

pub fn handle_discover(ctx: &mut CommandContext) -> Result<()> {
    let report = ctx.orchestrator.discover_and_queue()?;

    println!("{}", report.to_string().green());
    for id in &report.queued {
        let problem = ctx.orchestrator.store().get_problem(id)?;
        println!(
            "  {} [{}] {}",
            problem.id.cyan(),
            super::utils::format_priority(problem.priority),
            problem.title
        );
    }
    Ok(())
}
