// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use clap::{Parser, Subcommand};
use tm_core::TaskId;

pub use args::{ListArg, MoveArgs};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

// Custom help template that groups commands into sections
const HELP_TEMPLATE: &str = "{about-with-newline}
{usage-heading} {usage}

{before-help}Options:
{options}{after-help}";

const COMMANDS_HELP: &str = "\
Tasks:
  add         Add a task to a list
  show        Show a list as an indented tree
  edit        Edit a task's title, notes or due date
  indent      Indent or outdent a task with its subtasks
  move        Move a task with its subtasks
  done        Complete a task and its subtasks
  reopen      Mark a completed task as not done
  rm          Delete a task, promoting its subtasks

Lists & Sync:
  init        Initialize a replica in this directory
  lists       Show known lists
  list        Create, rename, remove or select lists
  sync        Run a sync session now
  status      Show the last sync result";

const QUICKSTART_HELP: &str = "\
Get started:
  tm init --remote ../shared    Initialize with a shared remote
  tm list add Inbox             Create a list and make it the default
  tm add \"Buy milk\"             Add a task
  tm show                       Show the default list
  tm sync                       Sync with the remote";

#[derive(Parser)]
#[command(name = "tm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "An offline task list replica with two-way remote sync")]
#[command(
    long_about = "An offline task list replica with two-way remote sync.\n\n\
    Tasks live in a local SQLite store; sync mirrors each list, hierarchy and \
    order included, to a remote task service."
)]
#[command(help_template = HELP_TEMPLATE)]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Run as if tm was started in <path>
    #[arg(short = 'C', long = "directory", global = true, value_name = "path")]
    pub directory: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    // ─────────────────────────────────────────────────────────────────────────
    // Tasks
    // ─────────────────────────────────────────────────────────────────────────
    /// Add a task to the end of a list
    #[command(after_help = "Examples:\n  \
        tm add \"Buy milk\"                     Add to the default list\n  \
        tm add \"Report\" -l Work               Add to the list titled Work\n  \
        tm add \"Call\" --due 2026-03-01T09:30  Add with a due time")]
    Add {
        /// Task title
        #[arg(value_parser = non_empty_string)]
        title: String,

        #[command(flatten)]
        list: ListArg,

        /// Notes
        #[arg(long)]
        notes: Option<String>,

        /// Due date (YYYY-MM-DD or YYYY-MM-DDTHH:MM)
        #[arg(long)]
        due: Option<String>,
    },

    /// Show a list as an indented tree
    Show {
        #[command(flatten)]
        list: ListArg,

        /// Hide completed tasks
        #[arg(long)]
        open: bool,
    },

    /// Edit a task's properties
    #[command(after_help = "Examples:\n  \
        tm edit 4 --title \"New title\"   Rename task 4\n  \
        tm edit 4 --notes \"\"            Clear notes\n  \
        tm edit 4 --due none            Clear the due date")]
    Edit {
        /// Task ID
        id: TaskId,

        /// New title
        #[arg(long, value_parser = non_empty_string)]
        title: Option<String>,

        /// New notes (empty clears)
        #[arg(long)]
        notes: Option<String>,

        /// New due date ("none" clears)
        #[arg(long)]
        due: Option<String>,
    },

    /// Indent a task under the task above it, or outdent with --out
    Indent {
        /// Task ID
        id: TaskId,

        /// Outdent instead
        #[arg(long)]
        out: bool,
    },

    /// Move a task and its subtasks
    Move {
        /// Task ID
        id: TaskId,

        #[command(flatten)]
        target: MoveArgs,
    },

    /// Complete task(s) and all of their subtasks
    #[command(arg_required_else_help = true)]
    Done {
        /// Task ID(s)
        #[arg(required = true)]
        ids: Vec<TaskId>,
    },

    /// Mark task(s) as not done
    #[command(arg_required_else_help = true)]
    Reopen {
        /// Task ID(s)
        #[arg(required = true)]
        ids: Vec<TaskId>,
    },

    /// Delete task(s); subtasks move up into their place
    #[command(arg_required_else_help = true)]
    Rm {
        /// Task ID(s)
        #[arg(required = true)]
        ids: Vec<TaskId>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Lists & sync
    // ─────────────────────────────────────────────────────────────────────────
    /// Initialize a replica in the current directory
    Init {
        /// Directory of the shared remote
        #[arg(long, value_name = "DIR")]
        remote: Option<String>,

        /// Token presented to the remote
        #[arg(long, requires = "remote")]
        token: Option<String>,
    },

    /// Show known lists
    Lists,

    /// Manage lists
    #[command(subcommand)]
    List(ListCommand),

    /// Run a sync session now
    Sync {
        /// Only print errors
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show the result of the last sync session
    Status,
}

/// List management commands.
///
/// Lists are created and renamed on the remote first, so these need a
/// configured remote.
#[derive(Subcommand)]
pub enum ListCommand {
    /// Create a list (becomes the default if none is set)
    Add {
        /// List title
        #[arg(value_parser = non_empty_string)]
        title: String,
    },

    /// Rename a list
    Rename {
        /// List ID or title
        list: String,

        /// New title
        #[arg(value_parser = non_empty_string)]
        title: String,
    },

    /// Remove a list and mark its tasks deleted
    Remove {
        /// List ID or title
        list: String,
    },

    /// Make a list the default
    Use {
        /// List ID or title
        list: String,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
