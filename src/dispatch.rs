//! Text commands for the interactive loop.
//!
//! A line such as `note checked the logs` parses into a [`Command`];
//! [`dispatch`] runs it against an [`Orchestrator`] and returns a printable
//! [`Response`].

use std::fmt;
use std::str::FromStr;

use crate::error::{NexusError, Result};
use crate::model::{Problem, SessionOutcome};
use crate::orchestrator::{ClosedSession, DiscoveryReport, Orchestrator, StatusReport};

pub const HELP: &str = "\
Commands:
  discover          find new problems and queue the best of them
  status            show the status report
  next              start a session on the highest priority problem
  note <text>       add a note to the current session
  progress <text>   record progress on the current session
  chat <text>       ask the advisor about the current problem
  complete          finish the current problem
  pause             put the current problem back in the queue
  help              show this help
  quit              pause any open session and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Discover,
    Status,
    Next,
    Note(String),
    Progress(String),
    Chat(String),
    Complete,
    Pause,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = NexusError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let with_text = |make: fn(String) -> Command| {
            if rest.is_empty() {
                Err(NexusError::Parse(format!("Usage: {} <text>", word.to_lowercase())))
            } else {
                Ok(make(rest.to_string()))
            }
        };

        match word.to_lowercase().as_str() {
            "discover" => Ok(Command::Discover),
            "status" => Ok(Command::Status),
            "next" => Ok(Command::Next),
            "note" => with_text(Command::Note),
            "progress" => with_text(Command::Progress),
            "chat" => with_text(Command::Chat),
            "complete" | "done" => Ok(Command::Complete),
            "pause" => Ok(Command::Pause),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "" => Err(NexusError::Parse("Empty command".to_string())),
            other => Err(NexusError::Parse(format!(
                "Unknown command '{}'. Type 'help' for a list of commands.",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Discovered(DiscoveryReport),
    Status(StatusReport),
    Started(Problem),
    QueueEmpty,
    Noted,
    ProgressLogged,
    Reply(String),
    Closed(ClosedSession),
    Help,
    Goodbye(Option<ClosedSession>),
}

impl Response {
    pub fn is_quit(&self) -> bool {
        matches!(self, Response::Goodbye(_))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Discovered(report) => write!(f, "{}", report),
            Response::Status(report) => write!(f, "{}", report.to_string().trim_end()),
            Response::Started(p) => write!(
                f,
                "Working on: {} ({})\n  Priority: {}  Estimated: {}h\n  URL: {}",
                p.title, p.id, p.priority, p.estimated_effort, p.url
            ),
            Response::QueueEmpty => write!(f, "No queued problems. Run 'discover' first."),
            Response::Noted => write!(f, "Note added."),
            Response::ProgressLogged => write!(f, "Progress logged."),
            Response::Reply(text) => write!(f, "Advisor: {}", text),
            Response::Closed(closed) => write!(
                f,
                "Session {} on {}: {} ({}h logged, {}h total)",
                closed.record.outcome,
                closed.problem.id,
                closed.problem.status,
                closed.record.elapsed_hours,
                closed.problem.actual_effort
            ),
            Response::Help => write!(f, "{}", HELP),
            Response::Goodbye(Some(closed)) => {
                write!(f, "Paused {}. Goodbye.", closed.problem.id)
            }
            Response::Goodbye(None) => write!(f, "Goodbye."),
        }
    }
}

/// Run one command against the orchestrator.
pub fn dispatch(orchestrator: &mut Orchestrator, command: Command) -> Result<Response> {
    tracing::debug!(command = ?command, "Dispatching command");
    match command {
        Command::Discover => orchestrator.discover_and_queue().map(Response::Discovered),
        Command::Status => orchestrator.status_report().map(Response::Status),
        Command::Next => match orchestrator.select_next()? {
            Some(problem) => {
                let session = orchestrator.start_session(&problem)?;
                Ok(Response::Started(session.problem().clone()))
            }
            None => Ok(Response::QueueEmpty),
        },
        Command::Note(text) => orchestrator.add_note(&text).map(|_| Response::Noted),
        Command::Progress(text) => orchestrator
            .add_progress(&text)
            .map(|_| Response::ProgressLogged),
        Command::Chat(text) => orchestrator.chat(&text).map(Response::Reply),
        Command::Complete => {
            orchestrator.add_progress("Problem marked as completed")?;
            orchestrator
                .end_session(SessionOutcome::Completed)
                .map(Response::Closed)
        }
        Command::Pause => {
            orchestrator.add_note("Session paused")?;
            orchestrator
                .end_session(SessionOutcome::Paused)
                .map(Response::Closed)
        }
        Command::Help => Ok(Response::Help),
        Command::Quit => orchestrator.shutdown().map(Response::Goodbye),
    }
}
