use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::dispatch::{Command, dispatch};
use crate::error::NexusError;

/// Read commands from stdin until `quit` or end of input.
///
/// Command errors are printed and the loop keeps going. A storage failure
/// ends the loop with an error.
pub fn handle_run(ctx: &mut CommandContext) -> Result<()> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();

    println!("{}", "Nexus ready. Type 'help' for commands.".bold());
    if let Some(session) = ctx.orchestrator.active_session() {
        println!("Resumed session on {}", session.problem_id().cyan());
    }

    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("{} ", "nexus>".cyan());
            io::stdout().flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command: Command = match line.parse() {
            Ok(command) => command,
            Err(e) => {
                println!("{} {}", "Error:".red(), e);
                continue;
            }
        };

        match dispatch(&mut ctx.orchestrator, command) {
            Ok(response) => {
                println!("{}", response);
                if response.is_quit() {
                    return Ok(());
                }
            }
            Err(e @ NexusError::Storage(_)) => {
                tracing::error!(error = %e, "Storage failure, stopping");
                return Err(e.into());
            }
            Err(e) => println!("{} {}", "Error:".red(), e),
        }
    }

    // End of input counts as quit
    if let Some(closed) = ctx.orchestrator.shutdown()? {
        println!("Paused {}.", closed.problem.id.cyan());
    }
    Ok(())
}
