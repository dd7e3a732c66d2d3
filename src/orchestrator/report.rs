use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::model::{Problem, ProblemStatus, SessionRecord};

/// Outcome of one discovery cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    /// Problems not seen before this cycle.
    pub new: usize,
    /// Ids moved to QUEUED, highest priority first.
    pub queued: Vec<String>,
    /// New problems stored as DISCOVERED because the cycle cap was reached.
    pub backlog: usize,
    /// New problems rejected by validation.
    pub skipped: usize,
}

impl fmt::Display for DiscoveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Discovered {} new problem(s): {} queued, {} in backlog",
            self.new,
            self.queued.len(),
            self.backlog
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        Ok(())
    }
}

/// What startup recovery did with problems left IN_PROGRESS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    pub requeued: Vec<String>,
    pub resumed: Option<String>,
}

impl RecoveryReport {
    pub fn is_empty(&self) -> bool {
        self.requeued.is_empty() && self.resumed.is_none()
    }
}

/// A closed session together with the problem as it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSession {
    pub record: SessionRecord,
    pub problem: Problem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblemSummary {
    pub id: String,
    pub title: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentSession {
    pub id: String,
    pub title: String,
    pub url: String,
    pub estimated_effort: u32,
    pub actual_effort: u32,
    pub elapsed_minutes: i64,
    pub budget_minutes: u32,
    pub over_budget: bool,
    pub notes: usize,
    pub progress: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub total: usize,
    pub counts: BTreeMap<ProblemStatus, usize>,
    pub total_effort: u32,
    pub current: Option<CurrentSession>,
    pub top_critical: Vec<ProblemSummary>,
}

impl StatusReport {
    pub fn count(&self, status: ProblemStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "NEXUS STATUS REPORT")?;
        writeln!(f, "{}", "=".repeat(40))?;
        writeln!(f, "Total Problems: {}", self.total)?;
        writeln!(f, "Total Effort: {} hours", self.total_effort)?;
        writeln!(f)?;
        writeln!(f, "Status Breakdown:")?;
        for status in ProblemStatus::ALL {
            writeln!(f, "  {}: {}", status, self.count(status))?;
        }

        if let Some(current) = &self.current {
            writeln!(f)?;
            writeln!(f, "Current: {} ({})", current.title, current.id)?;
            writeln!(f, "  URL: {}", current.url)?;
            write!(
                f,
                "  Elapsed: {}m of {}m",
                current.elapsed_minutes, current.budget_minutes
            )?;
            if current.over_budget {
                write!(f, " (over budget)")?;
            }
            writeln!(f)?;
        }

        if !self.top_critical.is_empty() {
            writeln!(f)?;
            writeln!(f, "Top Priority Problems:")?;
            for p in &self.top_critical {
                writeln!(f, "  - {} ({})", p.title, p.source)?;
            }
        }
        Ok(())
    }
}
