//! Data models for nexus.
//!
//! - [`Problem`]: a discovered unit of work
//! - [`ProblemStatus`]: lifecycle states and the transition table
//! - [`Priority`]: priority levels (low, medium, high, critical)
//! - [`SessionRecord`], [`SessionEntry`]: persisted work sessions
//! - [`ChatLogEntry`]: advisor conversation log

mod problem;
mod session;
mod types;

pub use problem::{MAX_ESTIMATED_EFFORT, Metadata, Problem};
pub use session::{
    ChatLogEntry, Sender, SessionEntry, SessionOutcome, SessionOwner, SessionRecord,
};
pub use types::{Priority, ProblemStatus};
