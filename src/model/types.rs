use crate::error::{NexusError, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Lifecycle state of a problem.
///
/// Every change of state goes through [`ProblemStatus::transition`], which is
/// the single place the edge table lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProblemStatus {
    #[default]
    Discovered,
    Queued,
    InProgress,
    Completed,
    Failed,
    Archived,
}

impl ProblemStatus {
    pub const ALL: [ProblemStatus; 6] = [
        ProblemStatus::Discovered,
        ProblemStatus::Queued,
        ProblemStatus::InProgress,
        ProblemStatus::Completed,
        ProblemStatus::Failed,
        ProblemStatus::Archived,
    ];

    /// States reachable from `self`.
    pub fn valid_transitions(&self) -> &'static [ProblemStatus] {
        match self {
            Self::Discovered => &[Self::Queued],
            Self::Queued => &[Self::InProgress, Self::Archived, Self::Failed],
            Self::InProgress => &[Self::Completed, Self::Queued, Self::Archived, Self::Failed],
            Self::Completed | Self::Failed | Self::Archived => &[],
        }
    }

    pub fn can_transition_to(&self, target: ProblemStatus) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// Validate the edge `self -> target` and return the new state.
    pub fn transition(self, target: ProblemStatus) -> Result<ProblemStatus> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(NexusError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ProblemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemStatus {
    type Err = NexusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "discovered" => Ok(ProblemStatus::Discovered),
            "queued" => Ok(ProblemStatus::Queued),
            "in_progress" | "in-progress" | "inprogress" => Ok(ProblemStatus::InProgress),
            "completed" | "done" => Ok(ProblemStatus::Completed),
            "failed" => Ok(ProblemStatus::Failed),
            "archived" => Ok(ProblemStatus::Archived),
            _ => Err(NexusError::Parse(format!("Invalid problem status: {}", s))),
        }
    }
}

/// Priority levels, ordered so that `Critical` compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for Priority {
    type Err = NexusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" | "p3" => Ok(Priority::Low),
            "medium" | "normal" | "p2" => Ok(Priority::Medium),
            "high" | "p1" => Ok(Priority::High),
            "critical" | "p0" => Ok(Priority::Critical),
            _ => Err(NexusError::Parse(format!("Invalid priority: {}", s))),
        }
    }
}
