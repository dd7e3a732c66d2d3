use crate::config::{CONFIG_FILE_NAME, NexusConfig};
use crate::storage::ProblemStore;
use anyhow::Result;
use colored::Colorize;

pub fn handle_init(path: Option<String>, max_queue: Option<usize>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config_path = cwd.join(CONFIG_FILE_NAME);

    if config_path.exists() {
        return Err(crate::error::NexusError::AlreadyInitialized(
            config_path.display().to_string(),
        )
        .into());
    }

    let mut config = NexusConfig::default();
    if let Some(path) = path {
        config.nexus.path = path;
    }
    if let Some(max_queue) = max_queue {
        config.nexus.max_queue = max_queue;
    }
    config.validate()?;

    // Opening the store creates the data directory
    let data_path = config.data_path(&cwd);
    ProblemStore::open(&data_path)?;

    config.save(&config_path)?;

    println!(
        "{} nexus project in {}",
        "Initialized".green(),
        cwd.display()
    );
    println!("  Config: {}", config_path.display());
    println!("  Data:   {}", data_path.display());

    Ok(())
}
