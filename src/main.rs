use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use nexus::cli::handlers::{self, CommandContext};
use nexus::cli::{Cli, Commands};
use nexus::config::NexusConfig;
use nexus::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { path, max_queue } = cli.command {
        logging::init(cli.verbose, None);
        return handlers::handle_init(path, max_queue);
    }

    let (config, root) = load_config(cli.config.as_deref())?;
    logging::init(cli.verbose, config.log_path(&root));

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Discover { from_file } => {
            let mut ctx = mutating_context(config, root, from_file.as_deref())?;
            handlers::handle_discover(&mut ctx)
        }
        Commands::Status { json } => {
            let ctx = context(config, root, None)?;
            handlers::handle_status(&ctx, json)
        }
        Commands::List {
            status,
            priority,
            json,
        } => {
            let ctx = context(config, root, None)?;
            handlers::handle_list(&ctx, status, priority, json)
        }
        Commands::Show { id, json } => {
            let ctx = context(config, root, None)?;
            handlers::handle_show(&ctx, id, json)
        }
        Commands::Queue { id } => {
            let mut ctx = mutating_context(config, root, None)?;
            handlers::handle_queue(&mut ctx, id)
        }
        Commands::Archive { id } => {
            let mut ctx = mutating_context(config, root, None)?;
            handlers::handle_archive(&mut ctx, id)
        }
        Commands::Fail { id } => {
            let mut ctx = mutating_context(config, root, None)?;
            handlers::handle_fail(&mut ctx, id)
        }
        Commands::Run { from_file } => {
            let mut ctx = mutating_context(config, root, from_file.as_deref())?;
            handlers::handle_run(&mut ctx)
        }
    }
}

fn load_config(explicit: Option<&str>) -> Result<(NexusConfig, PathBuf)> {
    match explicit {
        Some(path) => NexusConfig::load_from(Path::new(path))
            .with_context(|| format!("Failed to load nexus configuration from {}", path)),
        None => {
            let cwd = std::env::current_dir()?;
            NexusConfig::load(&cwd).context("Failed to load nexus configuration")
        }
    }
}

fn context(config: NexusConfig, root: PathBuf, from_file: Option<&str>) -> Result<CommandContext> {
    CommandContext::new(config, root, from_file.map(Path::new))
}

/// Context for commands that write to the store, after startup recovery.
fn mutating_context(
    config: NexusConfig,
    root: PathBuf,
    from_file: Option<&str>,
) -> Result<CommandContext> {
    let mut ctx = context(config, root, from_file)?;
    ctx.recover()?;
    Ok(ctx)
}
