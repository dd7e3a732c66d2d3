use crate::error::{NexusError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".nexus.yml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NexusConfig {
    #[serde(default)]
    pub nexus: NexusSettings,

    #[serde(default)]
    pub github: GitHubSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NexusSettings {
    /// Data directory, relative to the project root.
    #[serde(default = "default_path")]
    pub path: String,

    /// How many new problems a single discovery cycle may queue.
    #[serde(default = "default_max_queue")]
    pub max_queue: usize,

    /// Time budget of one work session.
    #[serde(default = "default_session_minutes")]
    pub session_minutes: u32,

    #[serde(default)]
    pub recovery: RecoveryPolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

/// What to do with a problem found IN_PROGRESS at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryPolicy {
    /// Put it back in the queue.
    #[default]
    Requeue,
    /// Reattach a fresh session to it.
    Resume,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_queries")]
    pub queries: Vec<String>,

    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Falls back to the `GITHUB_TOKEN` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_path() -> String {
    ".nexus".to_string()
}

fn default_max_queue() -> usize {
    10
}

fn default_session_minutes() -> u32 {
    120
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_queries() -> Vec<String> {
    vec![
        r#"is:issue is:open label:"help wanted""#.to_string(),
        r#"is:issue is:open label:"good first issue""#.to_string(),
        r#"is:issue is:open label:"bug" comments:>10"#.to_string(),
        r#"is:issue is:open label:"enhancement" reactions:>5"#.to_string(),
    ]
}

fn default_per_page() -> u32 {
    30
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for NexusSettings {
    fn default() -> Self {
        Self {
            path: default_path(),
            max_queue: default_max_queue(),
            session_minutes: default_session_minutes(),
            recovery: RecoveryPolicy::default(),
            log_file: None,
        }
    }
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            queries: default_queries(),
            per_page: default_per_page(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

impl GitHubSettings {
    pub fn resolved_token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
    }
}

impl NexusConfig {
    /// Load the config found at or above `start_path`. Returns the project root too.
    pub fn load(start_path: &Path) -> Result<(Self, PathBuf)> {
        let config_path = Self::find_config_file(start_path)?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<(Self, PathBuf)> {
        let content = std::fs::read_to_string(config_path)?;
        let config: NexusConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        let project_root = config_path
            .parent()
            .ok_or_else(|| NexusError::Config("Config file has no parent directory".to_string()))?
            .to_path_buf();
        Ok((config, project_root))
    }

    pub fn find_config_file(start_path: &Path) -> Result<PathBuf> {
        Self::find_config_file_below(start_path, None)
    }

    /// Walk up from `start_path`, giving up after `ceiling` has been checked.
    fn find_config_file_below(start_path: &Path, ceiling: Option<&Path>) -> Result<PathBuf> {
        let mut current = start_path.to_path_buf();
        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(config_path);
            }
            if ceiling == Some(current.as_path()) || !current.pop() {
                return Err(NexusError::NotInitialized);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.nexus.path.trim().is_empty() {
            return Err(NexusError::Config("nexus.path cannot be empty".to_string()));
        }
        if self.nexus.session_minutes == 0 {
            return Err(NexusError::Config(
                "nexus.session_minutes must be positive".to_string(),
            ));
        }
        if self.github.timeout_secs == 0 {
            return Err(NexusError::Config(
                "github.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn data_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.nexus.path)
    }

    pub fn log_path(&self, project_root: &Path) -> Option<PathBuf> {
        self.nexus.log_file.as_ref().map(|f| project_root.join(f))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
