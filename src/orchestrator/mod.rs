//! Discovery, queueing and the single active work session.
//!
//! The [`Orchestrator`] owns the store, the scanner and the one
//! [`WorkSession`] that may be open at a time. Every status change goes
//! through [`ProblemStatus::transition`](crate::model::ProblemStatus::transition).

mod report;
mod session;

pub use report::{
    ClosedSession, CurrentSession, DiscoveryReport, ProblemSummary, RecoveryReport, StatusReport,
};
pub use session::WorkSession;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::advisor::{Advisor, HeuristicAdvisor};
use crate::clock::{Clock, SystemClock};
use crate::config::{NexusConfig, RecoveryPolicy};
use crate::error::{NexusError, Result};
use crate::model::{
    ChatLogEntry, Priority, Problem, ProblemStatus, Sender, SessionOutcome, SessionOwner,
};
use crate::scanner::ProblemScanner;
use crate::storage::ProblemStore;
use crate::validation;

const TOP_CRITICAL_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub queries: Vec<String>,
    pub max_queue: usize,
    pub session_minutes: u32,
    pub recovery: RecoveryPolicy,
}

impl OrchestratorSettings {
    pub fn from_config(config: &NexusConfig) -> Self {
        Self {
            queries: config.github.queries.clone(),
            max_queue: config.nexus.max_queue,
            session_minutes: config.nexus.session_minutes,
            recovery: config.nexus.recovery,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&NexusConfig::default())
    }
}

pub struct Orchestrator {
    store: ProblemStore,
    scanner: ProblemScanner,
    settings: OrchestratorSettings,
    clock: Box<dyn Clock>,
    advisor: Box<dyn Advisor>,
    active: Option<WorkSession>,
}

impl Orchestrator {
    /// Front ends that write to the store should call [`recover`](Self::recover)
    /// right after building.
    pub fn new(store: ProblemStore, scanner: ProblemScanner, settings: OrchestratorSettings) -> Self {
        Self {
            store,
            scanner,
            settings,
            clock: Box::new(SystemClock),
            advisor: Box::new(HeuristicAdvisor),
            active: None,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_advisor(mut self, advisor: impl Advisor + 'static) -> Self {
        self.advisor = Box::new(advisor);
        self
    }

    pub fn store(&self) -> &ProblemStore {
        &self.store
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn active_session(&self) -> Option<&WorkSession> {
        self.active.as_ref()
    }

    /// Find new problems and queue the best of them.
    pub fn discover_and_queue(&mut self) -> Result<DiscoveryReport> {
        tracing::info!("Discovering new problems");
        let now = self.clock.now();
        let known = self.store.known_ids()?;

        let mut new_problems: Vec<Problem> = self
            .scanner
            .discover(&self.settings.queries, &known, now)
            .into_iter()
            .filter(|p| !known.contains(&p.id))
            .collect();
        new_problems.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let mut report = DiscoveryReport {
            new: new_problems.len(),
            ..DiscoveryReport::default()
        };

        let mut batch = Vec::with_capacity(new_problems.len());
        for mut problem in new_problems {
            if let Err(e) = validation::validate_problem(&problem) {
                tracing::warn!(id = %problem.id, reason = %e, "Skipping invalid problem");
                report.skipped += 1;
                continue;
            }
            if report.queued.len() < self.settings.max_queue {
                problem.transition_to(ProblemStatus::Queued, now)?;
                report.queued.push(problem.id.clone());
            } else {
                report.backlog += 1;
            }
            batch.push(problem);
        }
        self.store.save_problems(&batch)?;

        for problem in batch.iter().filter(|p| p.status == ProblemStatus::Queued) {
            tracing::info!(id = %problem.id, priority = %problem.priority, title = %problem.title, "Queued problem");
        }

        tracing::info!(
            queued = report.queued.len(),
            backlog = report.backlog,
            "Discovery cycle finished"
        );
        Ok(report)
    }

    /// The QUEUED problem to work on next, if any.
    ///
    /// Ordered by priority, then estimated effort (both descending), then id.
    pub fn select_next(&self) -> Result<Option<Problem>> {
        let queued = self.store.get_problems(Some(ProblemStatus::Queued))?;
        Ok(queued.into_iter().min_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.estimated_effort.cmp(&a.estimated_effort))
                .then_with(|| a.id.cmp(&b.id))
        }))
    }

    /// Open a session on `problem`, which must be QUEUED and current.
    ///
    /// The store refuses the claim when any problem is already IN_PROGRESS,
    /// including one held by another process.
    pub fn start_session(&mut self, problem: &Problem) -> Result<&WorkSession> {
        if let Some(active) = &self.active {
            return Err(NexusError::Conflict(format!(
                "A work session is already active on {}",
                active.problem_id()
            )));
        }

        let now = self.clock.now();
        let mut claimed = problem.clone();
        claimed.transition_to(ProblemStatus::InProgress, now)?;
        self.store
            .claim_problem(problem, &claimed, SessionOwner::current(&claimed.id, now))?;

        let mut session = WorkSession::start(claimed, now, self.settings.session_minutes);
        let analysis = self.advisor.analyze(session.problem());
        session.add_note(&analysis.to_string(), now)?;

        Ok(&*self.active.insert(session))
    }

    pub fn add_note(&mut self, text: &str) -> Result<()> {
        let now = self.clock.now();
        self.active
            .as_mut()
            .ok_or(NexusError::NoActiveSession)?
            .add_note(text, now)
    }

    pub fn add_progress(&mut self, text: &str) -> Result<()> {
        let now = self.clock.now();
        self.active
            .as_mut()
            .ok_or(NexusError::NoActiveSession)?
            .add_progress(text, now)
    }

    /// Ask the advisor about the current problem. Both sides are logged.
    pub fn chat(&mut self, message: &str) -> Result<String> {
        validation::validate_entry(message)?;
        let session = self.active.as_ref().ok_or(NexusError::NoActiveSession)?;
        let problem = session.problem().clone();
        let reply = self.advisor.reply(message, &problem);
        let context = serde_json::json!({
            "title": problem.title,
            "url": problem.url,
            "status": problem.status,
        });

        let now = self.clock.now();
        let entries = [(Sender::User, message), (Sender::Advisor, reply.as_str())].map(
            |(sender, text)| ChatLogEntry {
                problem_id: problem.id.clone(),
                timestamp: now,
                message: text.to_string(),
                sender,
                context: context.clone(),
            },
        );
        self.store.append_chat_logs(&entries)?;
        Ok(reply)
    }

    /// Close the active session as completed or paused.
    ///
    /// Elapsed whole hours are added to the problem's effort either way, so
    /// pausing and resuming accumulates effort across sessions.
    pub fn end_session(&mut self, outcome: SessionOutcome) -> Result<ClosedSession> {
        let target = match outcome {
            SessionOutcome::Completed => ProblemStatus::Completed,
            SessionOutcome::Paused => ProblemStatus::Queued,
            SessionOutcome::Abandoned => {
                return Err(NexusError::Validation(
                    "Sessions are abandoned by archiving or failing the problem".to_string(),
                ));
            }
        };
        self.close_active(outcome, target)
    }

    fn close_active(
        &mut self,
        outcome: SessionOutcome,
        target: ProblemStatus,
    ) -> Result<ClosedSession> {
        let session = self.active.as_ref().ok_or(NexusError::NoActiveSession)?;
        let (record, problem) = session.close(outcome, target, self.clock.now())?;
        // Slot is cleared only after the commit so a storage failure can be retried
        match self.store.close_session(&record, &problem) {
            Ok(record) => {
                self.active = None;
                Ok(ClosedSession { record, problem })
            }
            Err(e @ NexusError::Conflict(_)) => {
                tracing::warn!(id = %problem.id, error = %e, "Session was closed by another process");
                self.active = None;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Pause any open session. Call before the process exits.
    pub fn shutdown(&mut self) -> Result<Option<ClosedSession>> {
        if self.active.is_none() {
            return Ok(None);
        }
        tracing::info!("Pausing open session before shutdown");
        self.end_session(SessionOutcome::Paused).map(Some)
    }

    pub fn archive(&mut self, id: &str) -> Result<Problem> {
        self.admin_transition(id, ProblemStatus::Archived)
    }

    pub fn fail(&mut self, id: &str) -> Result<Problem> {
        self.admin_transition(id, ProblemStatus::Failed)
    }

    /// Move a problem into the queue by hand (e.g. from the backlog).
    pub fn queue(&mut self, id: &str) -> Result<Problem> {
        self.admin_transition(id, ProblemStatus::Queued)
    }

    /// An admin action on the active problem abandons its session first.
    fn admin_transition(&mut self, id: &str, target: ProblemStatus) -> Result<Problem> {
        if self.active.as_ref().is_some_and(|s| s.problem_id() == id) {
            tracing::info!(id = %id, status = %target, "Abandoning active session");
            return self
                .close_active(SessionOutcome::Abandoned, target)
                .map(|closed| closed.problem);
        }
        self.apply_transition(id, target)
    }

    fn apply_transition(&mut self, id: &str, target: ProblemStatus) -> Result<Problem> {
        let now = self.clock.now();
        self.store.modify_problem(id, |problem| {
            tracing::info!(id = %id, from = %problem.status, to = %target, "Changing problem status");
            problem.transition_to(target, now)
        })
    }

    /// Deal with problems left IN_PROGRESS by a crashed run.
    ///
    /// A problem whose recorded session owner is another running process is
    /// left alone.
    pub fn recover(&mut self) -> Result<RecoveryReport> {
        let active_id = self.active.as_ref().map(|s| s.problem_id().to_string());
        let live_owner = self
            .store
            .session_owner()?
            .filter(|owner| owner.held_elsewhere());
        if let Some(owner) = &live_owner {
            tracing::info!(id = %owner.problem_id, pid = owner.pid, "Session is open in another process");
        }

        let mut stuck: Vec<Problem> = self
            .store
            .get_problems(Some(ProblemStatus::InProgress))?
            .into_iter()
            .filter(|p| active_id.as_deref() != Some(p.id.as_str()))
            .filter(|p| live_owner.as_ref().is_none_or(|o| o.problem_id != p.id))
            .collect();

        let mut report = RecoveryReport::default();
        if stuck.is_empty() {
            return Ok(report);
        }

        tracing::warn!(
            count = stuck.len(),
            policy = ?self.settings.recovery,
            "Found problems left in progress without a session"
        );
        stuck.sort_by(|a, b| a.id.cmp(&b.id));

        let resume_id = match self.settings.recovery {
            RecoveryPolicy::Resume if self.active.is_none() && live_owner.is_none() => {
                stuck.first().map(|p| p.id.clone())
            }
            _ => None,
        };

        let now = self.clock.now();
        for problem in stuck {
            if resume_id.as_deref() == Some(problem.id.as_str()) {
                let problem = self
                    .store
                    .adopt_session(SessionOwner::current(&problem.id, now))?;
                let mut session =
                    WorkSession::start(problem, now, self.settings.session_minutes);
                session.add_note("Session resumed after restart", now)?;
                report.resumed = Some(session.problem_id().to_string());
                self.active = Some(session);
            } else {
                self.store.modify_problem(&problem.id, |p| {
                    p.transition_to(ProblemStatus::Queued, now)
                })?;
                tracing::info!(id = %problem.id, "Requeued interrupted problem");
                report.requeued.push(problem.id);
            }
        }
        Ok(report)
    }

    pub fn status_report(&self) -> Result<StatusReport> {
        let problems = self.store.get_problems(None)?;

        let mut counts: BTreeMap<ProblemStatus, usize> =
            ProblemStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for p in &problems {
            *counts.entry(p.status).or_insert(0) += 1;
        }

        let now = self.clock.now();
        let current = self.active.as_ref().map(|s| CurrentSession {
            id: s.problem().id.clone(),
            title: s.problem().title.clone(),
            url: s.problem().url.clone(),
            estimated_effort: s.problem().estimated_effort,
            actual_effort: s.problem().actual_effort,
            elapsed_minutes: s.elapsed(now).num_minutes(),
            budget_minutes: s.budget_minutes(),
            over_budget: s.is_over_budget(now),
            notes: s.notes().len(),
            progress: s.progress().len(),
        });

        let top_critical = problems
            .iter()
            .filter(|p| p.priority == Priority::Critical && p.status == ProblemStatus::Queued)
            .take(TOP_CRITICAL_LIMIT)
            .map(|p| ProblemSummary {
                id: p.id.clone(),
                title: p.title.clone(),
                source: p.source.clone(),
            })
            .collect();

        Ok(StatusReport {
            total: problems.len(),
            counts,
            total_effort: problems.iter().map(|p| p.actual_effort).sum(),
            current,
            top_critical,
        })
    }
}
