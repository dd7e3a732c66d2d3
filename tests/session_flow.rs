use chrono::{Duration, TimeZone, Utc};
use nexus::clock::ManualClock;
use nexus::dispatch::{Command, Response, dispatch};
use nexus::error::{NexusError, Result};
use nexus::model::{Priority, ProblemStatus, SessionOutcome};
use nexus::orchestrator::{Orchestrator, OrchestratorSettings};
use nexus::scanner::{IssueSource, ProblemScanner, RawIssue, problem_id};
use nexus::storage::ProblemStore;
use tempfile::TempDir;

/// Fixed search results; any query containing "broken" fails.
struct FixtureSource {
    issues: Vec<serde_json::Value>,
}

impl IssueSource for FixtureSource {
    fn name(&self) -> &str {
        "github"
    }

    fn search(&self, query: &str) -> Result<Vec<RawIssue>> {
        if query.contains("broken") {
            return Err(NexusError::Network("connection reset".to_string()));
        }
        Ok(nexus::scanner::decode_issues(self.issues.clone()))
    }
}

fn fixture_issues() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({
            "id": 7,
            "title": "Panic on empty input",
            "labels": [{"name": "bug"}],
            "comments": 60,
            "reactions": {"+1": 25, "url": "https://example.invalid"}
        }),
        serde_json::json!({
            "id": 8,
            "title": "Typo in README",
            "labels": [{"name": "documentation"}]
        }),
        // Malformed: no id
        serde_json::json!({"title": "No id here"}),
    ]
}

fn orchestrator(temp: &TempDir, clock: &ManualClock) -> Orchestrator {
    let store = ProblemStore::open(&temp.path().join(".nexus")).unwrap();
    let scanner = ProblemScanner::new(Box::new(FixtureSource {
        issues: fixture_issues(),
    }));
    let settings = OrchestratorSettings {
        queries: vec!["is:issue broken".to_string(), "is:issue is:open".to_string()],
        ..OrchestratorSettings::default()
    };
    Orchestrator::new(store, scanner, settings).with_clock(clock.clone())
}

fn run(orch: &mut Orchestrator, line: &str) -> Response {
    let command: Command = line.parse().unwrap();
    dispatch(orch, command).unwrap()
}

#[test]
fn test_discover_next_note_complete() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
    let mut orch = orchestrator(&temp, &clock);

    let Response::Discovered(report) = run(&mut orch, "discover") else {
        panic!("expected a discovery report");
    };
    assert_eq!(report.new, 2);
    let critical_id = problem_id("github", "7");
    assert_eq!(report.queued[0], critical_id);

    let Response::Started(problem) = run(&mut orch, "next") else {
        panic!("expected a started session");
    };
    assert_eq!(problem.id, critical_id);
    assert_eq!(problem.priority, Priority::Critical);
    assert_eq!(problem.status, ProblemStatus::InProgress);

    clock.advance(Duration::minutes(20));
    assert_eq!(run(&mut orch, "note reproduced with an empty file"), Response::Noted);
    clock.advance(Duration::minutes(70));
    assert_eq!(run(&mut orch, "progress guard added"), Response::ProgressLogged);

    let Response::Closed(closed) = run(&mut orch, "complete") else {
        panic!("expected a closed session");
    };
    assert_eq!(closed.record.outcome, SessionOutcome::Completed);
    assert_eq!(closed.record.elapsed_hours, 1);
    assert_eq!(closed.problem.actual_effort, 1);
    assert_eq!(closed.problem.status, ProblemStatus::Completed);

    let progress: Vec<_> = closed.record.progress.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(progress, ["guard added", "Problem marked as completed"]);

    // State survives a restart
    drop(orch);
    let store = ProblemStore::open(&temp.path().join(".nexus")).unwrap();
    let stored = store.get_problem(&critical_id).unwrap();
    assert_eq!(stored.status, ProblemStatus::Completed);
    assert_eq!(stored.actual_effort, 1);
    assert_eq!(store.sessions_for(&critical_id).unwrap().len(), 1);
}

#[test]
fn test_second_discover_queues_nothing() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(Utc::now());
    let mut orch = orchestrator(&temp, &clock);

    run(&mut orch, "discover");
    let Response::Discovered(second) = run(&mut orch, "discover") else {
        panic!("expected a discovery report");
    };
    assert_eq!(second.new, 0);
    assert!(second.queued.is_empty());
}

#[test]
fn test_pause_resume_and_chat() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(Utc::now());
    let mut orch = orchestrator(&temp, &clock);
    run(&mut orch, "discover");

    run(&mut orch, "next");
    let Response::Reply(reply) = run(&mut orch, "chat how long will this take?") else {
        panic!("expected an advisor reply");
    };
    assert!(reply.contains("remaining"));
    clock.advance(Duration::hours(2));
    let Response::Closed(paused) = run(&mut orch, "pause") else {
        panic!("expected a closed session");
    };
    assert_eq!(paused.problem.status, ProblemStatus::Queued);

    // Paused problem is still the best candidate
    let Response::Started(again) = run(&mut orch, "next") else {
        panic!("expected a started session");
    };
    assert_eq!(again.id, paused.problem.id);
    assert_eq!(again.actual_effort, 2);

    clock.advance(Duration::minutes(59));
    let Response::Goodbye(Some(closed)) = run(&mut orch, "quit") else {
        panic!("expected the open session to be paused");
    };
    assert_eq!(closed.record.elapsed_hours, 0);
    assert_eq!(closed.problem.actual_effort, 2);
    assert_eq!(orch.store().chat_logs_for(&again.id).unwrap().len(), 2);
}

#[test]
fn test_commands_without_session_fail_cleanly() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(Utc::now());
    let mut orch = orchestrator(&temp, &clock);

    for line in ["note hello", "progress step", "chat hi", "complete", "pause"] {
        let err = dispatch(&mut orch, line.parse().unwrap()).unwrap_err();
        assert!(matches!(err, NexusError::NoActiveSession), "{}: {}", line, err);
    }
    assert_eq!(run(&mut orch, "quit"), Response::Goodbye(None));
}

#[test]
fn test_status_during_session() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(Utc::now());
    let mut orch = orchestrator(&temp, &clock);
    run(&mut orch, "discover");
    run(&mut orch, "next");
    clock.advance(Duration::minutes(30));

    let Response::Status(report) = run(&mut orch, "status") else {
        panic!("expected a status report");
    };
    assert_eq!(report.total, 2);
    assert_eq!(report.count(ProblemStatus::InProgress), 1);
    assert_eq!(report.count(ProblemStatus::Queued), 1);
    let current = report.current.unwrap();
    assert_eq!(current.elapsed_minutes, 30);
    assert!(!current.over_budget);
    // Analysis note from the advisor
    assert_eq!(current.notes, 1);
}
