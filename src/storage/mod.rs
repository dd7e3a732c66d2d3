//! File-based storage layer for nexus.
//!
//! Problems, closed work sessions and chat logs live in a single JSON document,
//! `nexus.json`, inside the data directory (`.nexus/` by default):
//!
//! ```json
//! {
//!   "problems": { "github-3f9a1c2b7d4e": { "id": "github-3f9a1c2b7d4e", "status": "queued", ... } },
//!   "work_sessions": [ { "id": 1, "problem_id": "github-3f9a1c2b7d4e", "outcome": "paused", ... } ],
//!   "chat_logs": [ { "problem_id": "github-3f9a1c2b7d4e", "sender": "user", ... } ],
//!   "next_session_id": 1,
//!   "session_owner": { "pid": 4242, "problem_id": "github-3f9a1c2b7d4e", "started_at": "..." }
//! }
//! ```
//!
//! Keeping one document means a session close (session insert plus problem
//! update) commits with a single atomic rename. Writers serialize on
//! `nexus.json.lock` and re-read the document before changing it, so separate
//! `nexus` processes sharing a data directory do not overwrite each other.

mod store;

pub use store::{LOCK_FILE_NAME, ProblemStore, STORE_FILE_NAME};
