//! # Nexus - discover, queue and work open-source problems
//!
//! Nexus searches issue trackers for problems worth solving, scores them by
//! community signal, queues the best ones and runs timed work sessions on
//! them one at a time.
//!
//! ## Features
//!
//! - **Discovery**: GitHub issue search (or a saved response file) turned into scored problems
//! - **Single-file storage**: problems, sessions and chat logs in `.nexus/nexus.json`,
//!   written atomically
//! - **Work sessions**: one active session, effort tracked in whole hours
//! - **Interactive loop**: `nexus run` reads text commands from stdin
//!
//! ## Quick Start
//!
//! ```bash
//! # Initialize a new nexus project
//! nexus init
//!
//! # Find and queue problems
//! nexus discover
//!
//! # Work through the queue
//! nexus run
//! ```
//!
//! ## Modules
//!
//! - [`cli`]: Command-line interface definitions and handlers
//! - [`config`]: Configuration loading and management
//! - [`dispatch`]: Text commands for the interactive loop
//! - [`error`]: Error types and result aliases
//! - [`model`]: Data models (Problem, ProblemStatus, SessionRecord, etc.)
//! - [`orchestrator`]: Discovery, queueing and work sessions
//! - [`scanner`]: Issue sources, scoring and effort estimation
//! - [`storage`]: The JSON problem store
//! - [`validation`]: Input validation utilities

/// Offline advisor for session analysis and chat replies.
pub mod advisor;

/// Command-line interface definitions using clap.
pub mod cli;

/// Time source abstraction.
pub mod clock;

/// Configuration loading and management.
///
/// Handles `.nexus.yml` configuration files and project discovery.
pub mod config;

pub mod dispatch;

/// Error types and result aliases.
///
/// Defines `NexusError` enum and `Result<T>` type alias.
pub mod error;

pub mod logging;

/// Data models for nexus.
///
/// Includes `Problem`, `ProblemStatus`, `Priority` and session records.
pub mod model;

pub mod orchestrator;

pub mod scanner;

/// File-based storage layer.
pub mod storage;

/// Input validation utilities.
///
/// Validates ids, titles and session entries before they are stored.
pub mod validation;
