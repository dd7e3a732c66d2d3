mod discover;
mod init;
mod list;
mod mutate;
mod run;
mod show;
mod status;
mod utils;

pub use discover::handle_discover;
pub use init::handle_init;
pub use list::handle_list;
pub use mutate::{handle_archive, handle_fail, handle_queue};
pub use run::handle_run;
pub use show::handle_show;
pub use status::handle_status;

use crate::config::NexusConfig;
use crate::orchestrator::{Orchestrator, OrchestratorSettings};
use crate::scanner::{GitHubSearch, IssueSource, JsonFileSource, ProblemScanner};
use crate::storage::ProblemStore;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Common context passed to all command handlers
pub struct CommandContext {
    pub config: NexusConfig,
    pub root: PathBuf,
    pub orchestrator: Orchestrator,
}

impl CommandContext {
    /// Open the store and build the orchestrator.
    ///
    /// With `from_file` set, discovery reads a saved search response instead
    /// of calling GitHub.
    pub fn new(config: NexusConfig, root: PathBuf, from_file: Option<&Path>) -> Result<Self> {
        let store = ProblemStore::open(&config.data_path(&root))
            .context("Failed to open problem store")?;

        let source: Box<dyn IssueSource> = match from_file {
            Some(path) => Box::new(JsonFileSource::new(path)),
            None => Box::new(GitHubSearch::new(&config.github)?),
        };

        let settings = OrchestratorSettings::from_config(&config);
        let orchestrator = Orchestrator::new(store, ProblemScanner::new(source), settings);

        Ok(Self {
            config,
            root,
            orchestrator,
        })
    }

    /// Release sessions left open by a crashed process.
    ///
    /// Only commands that change the store call this; read-only commands
    /// must not touch a session another process is working on.
    pub fn recover(&mut self) -> Result<()> {
        let recovered = self
            .orchestrator
            .recover()
            .context("Failed to recover interrupted sessions")?;
        if !recovered.requeued.is_empty() {
            eprintln!(
                "{} {} interrupted problem(s): {}",
                "Requeued".yellow(),
                recovered.requeued.len(),
                recovered.requeued.join(", ")
            );
        }
        if let Some(id) = &recovered.resumed {
            eprintln!("{} session on {}", "Resumed".yellow(), id.cyan());
        }
        Ok(())
    }
}
