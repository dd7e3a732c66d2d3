use super::types::{Priority, ProblemStatus};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Auxiliary data carried from the issue source (repo, author, counts).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Upper bound for `estimated_effort`, in hours.
pub const MAX_ESTIMATED_EFFORT: u32 = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub source: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub status: ProblemStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub estimated_effort: u32,

    #[serde(default)]
    pub actual_effort: u32,
}

impl Problem {
    pub fn new(id: String, title: String, source: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            description: String::new(),
            source,
            url: String::new(),
            priority: Priority::default(),
            status: ProblemStatus::Discovered,
            created_at: now,
            updated_at: now,
            metadata: Metadata::new(),
            tags: BTreeSet::new(),
            estimated_effort: 0,
            actual_effort: 0,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_estimated_effort(mut self, hours: u32) -> Self {
        self.estimated_effort = hours.min(MAX_ESTIMATED_EFFORT);
        self
    }

    /// Move to `target` if the edge is legal, bumping `updated_at`.
    pub fn transition_to(&mut self, target: ProblemStatus, now: DateTime<Utc>) -> Result<()> {
        self.status = self.status.transition(target)?;
        self.updated_at = now;
        Ok(())
    }

    /// Fold whole hours of session time into `actual_effort`.
    pub fn add_effort(&mut self, hours: u32, now: DateTime<Utc>) {
        self.actual_effort = self.actual_effort.saturating_add(hours);
        self.updated_at = now;
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            ProblemStatus::Discovered | ProblemStatus::Queued | ProblemStatus::InProgress
        )
    }
}
