use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One timestamped line in a session's notes or progress log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub at: DateTime<Utc>,
    pub text: String,
}

impl fmt::Display for SessionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M"), self.text)
    }
}

/// How a work session was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    Completed,
    Paused,
    /// The problem was archived or failed while the session was open.
    Abandoned,
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::Completed => write!(f, "completed"),
            SessionOutcome::Paused => write!(f, "paused"),
            SessionOutcome::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Immutable record of a closed work session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Assigned by the store on insert.
    #[serde(default)]
    pub id: u64,
    pub problem_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub notes: Vec<SessionEntry>,
    #[serde(default)]
    pub progress: Vec<SessionEntry>,
    pub outcome: SessionOutcome,
    #[serde(default)]
    pub elapsed_hours: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Advisor,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Advisor => write!(f, "advisor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub problem_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub sender: Sender,
    #[serde(default)]
    pub context: serde_json::Value,
}

/// The process holding the open work session, as recorded in the store.
///
/// Recovery uses it to tell a session that is still being worked from one
/// left behind by a crashed process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOwner {
    pub pid: u32,
    pub problem_id: String,
    pub started_at: DateTime<Utc>,
}

impl SessionOwner {
    /// An owner record for the current process.
    pub fn current(problem_id: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            pid: std::process::id(),
            problem_id: problem_id.to_string(),
            started_at,
        }
    }

    /// True when the session belongs to another process that is still running.
    pub fn held_elsewhere(&self) -> bool {
        self.pid != std::process::id() && process_alive(self.pid)
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    // Signal 0 only checks the pid; EPERM means it exists under another user
    let delivered = unsafe { libc::kill(pid, 0) } == 0;
    delivered || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

// No cheap check here, so a foreign owner is assumed alive; `nexus queue <id>` releases it.
#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}
