use thiserror::Error;

use crate::model::ProblemStatus;

#[derive(Error, Debug)]
pub enum NexusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Problem not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ProblemStatus,
        to: ProblemStatus,
    },

    #[error("No active work session")]
    NoActiveSession,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Project not initialized. Run 'nexus init' first.")]
    NotInitialized,

    #[error("Project already initialized at {0}")]
    AlreadyInitialized(String),
}

impl NexusError {
    /// Whether the caller may reasonably retry or pick another action.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NexusError::Network(_)
                | NexusError::Conflict(_)
                | NexusError::Validation(_)
                | NexusError::InvalidTransition { .. }
                | NexusError::NoActiveSession
                | NexusError::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NexusError>;
