//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use stint_core::{Mode, Priority, Reason};

/// Focus-session time tracker.
///
/// Tracks time-boxed work on todos as sessions of contiguous focus,
/// pause and break segments, with streaks and focus totals derived from
/// the recorded timeline.
#[derive(Debug, Parser)]
#[command(name = "stint", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Act as this user instead of the configured one.
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the data directory and database.
    Init,

    /// Manage todos.
    Todo {
        #[command(subcommand)]
        action: TodoAction,
    },

    /// Start a session on a todo.
    Start {
        /// The todo to work on.
        todo_id: String,
    },

    /// Switch the active session to pause.
    Pause {
        /// Why the pause began.
        #[arg(long, default_value = "manual")]
        reason: Reason,
    },

    /// Switch the active session to a break.
    Break {
        /// Why the break began.
        #[arg(long, default_value = "manual")]
        reason: Reason,
    },

    /// Switch the active session back to focus.
    Resume {
        /// Why focus resumed.
        #[arg(long, default_value = "manual")]
        reason: Reason,
    },

    /// Stop the active session.
    Stop,

    /// Show the active session and its live durations.
    Status,

    /// Show recorded history.
    History {
        /// Show the sessions of one date (YYYY-MM-DD) with their segments.
        #[arg(long, conflicts_with_all = ["start", "end", "mode", "reason", "todo"])]
        date: Option<NaiveDate>,

        /// First date of the segment range (YYYY-MM-DD, inclusive).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date of the segment range (YYYY-MM-DD, inclusive).
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Only segments with this mode.
        #[arg(long)]
        mode: Option<Mode>,

        /// Only segments with this transition reason.
        #[arg(long)]
        reason: Option<Reason>,

        /// Only segments of sessions on this todo.
        #[arg(long)]
        todo: Option<String>,
    },

    /// Show streak and focus totals.
    Stats,
}

/// Todo management subcommands.
#[derive(Debug, Subcommand)]
pub enum TodoAction {
    /// Add a todo.
    Add {
        /// Title of the todo.
        title: String,

        /// Priority of the todo.
        #[arg(long, default_value = "med")]
        priority: Priority,
    },

    /// List todos with their lifetime focus time.
    List,

    /// Mark a todo as done.
    Done {
        /// The todo to complete.
        todo_id: String,
    },
}
