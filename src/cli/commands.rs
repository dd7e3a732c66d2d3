use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "nexus")]
#[command(
    author,
    version,
    about = "Discover open-source problems, queue the best ones, and work them in timed sessions"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (searches upward for .nexus.yml by default)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new nexus project
    Init {
        /// Data directory, relative to the project root
        #[arg(long)]
        path: Option<String>,

        /// Maximum number of problems queued per discovery cycle
        #[arg(long)]
        max_queue: Option<usize>,
    },

    /// Search for new problems and queue the best of them
    Discover {
        /// Read issues from a saved search response instead of GitHub
        #[arg(long)]
        from_file: Option<String>,
    },

    /// Show the status report
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List problems
    #[command(visible_alias = "ls")]
    List {
        /// Filter by status
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,

        /// Filter by priority
        #[arg(short, long, value_enum)]
        priority: Option<PriorityArg>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a problem and its session history
    Show {
        /// Problem ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move a problem into the work queue
    Queue {
        /// Problem ID
        id: String,
    },

    /// Archive a problem
    Archive {
        /// Problem ID
        id: String,
    },

    /// Mark a problem as failed
    Fail {
        /// Problem ID
        id: String,
    },

    /// Start the interactive work loop (reads commands from stdin)
    Run {
        /// Read issues from a saved search response instead of GitHub
        #[arg(long)]
        from_file: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Discovered,
    Queued,
    InProgress,
    Completed,
    Failed,
    Archived,
}

impl From<StatusArg> for crate::model::ProblemStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Discovered => crate::model::ProblemStatus::Discovered,
            StatusArg::Queued => crate::model::ProblemStatus::Queued,
            StatusArg::InProgress => crate::model::ProblemStatus::InProgress,
            StatusArg::Completed => crate::model::ProblemStatus::Completed,
            StatusArg::Failed => crate::model::ProblemStatus::Failed,
            StatusArg::Archived => crate::model::ProblemStatus::Archived,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Critical,
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for crate::model::Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Critical => crate::model::Priority::Critical,
            PriorityArg::High => crate::model::Priority::High,
            PriorityArg::Medium => crate::model::Priority::Medium,
            PriorityArg::Low => crate::model::Priority::Low,
        }
    }
}
