use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::model::{Problem, ProblemStatus, SessionEntry, SessionOutcome, SessionRecord};
use crate::validation;

/// A bounded, timed stretch of work on the one IN_PROGRESS problem.
///
/// Owned by the [`Orchestrator`](super::Orchestrator); notes and progress
/// live in memory until the session is closed and written as a
/// [`SessionRecord`].
#[derive(Debug, Clone)]
pub struct WorkSession {
    problem: Problem,
    start_time: DateTime<Utc>,
    budget_minutes: u32,
    notes: Vec<SessionEntry>,
    progress: Vec<SessionEntry>,
}

impl WorkSession {
    pub(crate) fn start(problem: Problem, now: DateTime<Utc>, budget_minutes: u32) -> Self {
        tracing::info!(id = %problem.id, title = %problem.title, "Starting work session");
        Self {
            problem,
            start_time: now,
            budget_minutes,
            notes: Vec::new(),
            progress: Vec::new(),
        }
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn problem_id(&self) -> &str {
        &self.problem.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn budget_minutes(&self) -> u32 {
        self.budget_minutes
    }

    pub fn notes(&self) -> &[SessionEntry] {
        &self.notes
    }

    pub fn progress(&self) -> &[SessionEntry] {
        &self.progress
    }

    pub fn add_note(&mut self, text: &str, now: DateTime<Utc>) -> Result<()> {
        Self::append(&mut self.notes, text, now)
    }

    pub fn add_progress(&mut self, text: &str, now: DateTime<Utc>) -> Result<()> {
        Self::append(&mut self.progress, text, now)
    }

    fn append(entries: &mut Vec<SessionEntry>, text: &str, now: DateTime<Utc>) -> Result<()> {
        validation::validate_entry(text)?;
        // Keep the log chronological even if the clock steps backwards
        let at = entries.last().map_or(now, |last| last.at.max(now));
        entries.push(SessionEntry {
            at,
            text: text.trim().to_string(),
        });
        Ok(())
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.start_time).max(Duration::zero())
    }

    /// Whole hours worked so far, rounded down.
    pub fn elapsed_hours(&self, now: DateTime<Utc>) -> u32 {
        u32::try_from(self.elapsed(now).num_hours()).unwrap_or(u32::MAX)
    }

    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> i64 {
        i64::from(self.budget_minutes) - self.elapsed(now).num_minutes()
    }

    pub fn is_over_budget(&self, now: DateTime<Utc>) -> bool {
        self.remaining_minutes(now) < 0
    }

    /// Build the closed record and the updated problem without touching the
    /// store. The session stays usable if the caller's commit fails.
    pub(crate) fn close(
        &self,
        outcome: SessionOutcome,
        target: ProblemStatus,
        now: DateTime<Utc>,
    ) -> Result<(SessionRecord, Problem)> {
        let end_time = now.max(self.start_time);
        let elapsed_hours = self.elapsed_hours(end_time);

        let mut problem = self.problem.clone();
        problem.add_effort(elapsed_hours, end_time);
        problem.transition_to(target, end_time)?;

        let record = SessionRecord {
            id: 0,
            problem_id: problem.id.clone(),
            start_time: self.start_time,
            end_time,
            notes: self.notes.clone(),
            progress: self.progress.clone(),
            outcome,
            elapsed_hours,
        };
        Ok((record, problem))
    }
}
