// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tmrs - An offline task list replica with two-way remote sync.
//!
//! This crate provides the functionality behind the `tm` CLI tool: a local
//! SQLite replica of hierarchical task lists that a [`sync::SyncSession`]
//! mirrors to a remote task service.
//!
//! # Main Components
//!
//! - [`tm_core::Database`] - SQLite-backed storage for tasks, lists and mirror records
//! - [`Config`] - Project configuration (remote, sync tunables, default list)
//! - [`sync`] - Reconciliation engine, session controller and remote clients
//! - [`Error`] - Error types for all operations
//!
//! # Initialization
//!
//! Use [`init_work_dir`] to create a new `.taskmirror/` directory, then open the database:
//!
//! ```rust,ignore
//! use tmrs::{init_work_dir, find_work_dir, get_db_path, Config};
//! use tm_core::Database;
//!
//! // Initialize a new replica
//! let work_dir = init_work_dir(Path::new("."), &Config::default())?;
//!
//! // Later, find and open an existing replica
//! let work_dir = find_work_dir()?;
//! let config = Config::load(&work_dir)?;
//! let db = Database::open(&get_db_path(&work_dir))?;
//! ```

mod cli;
mod commands;
mod logging;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, ListArg, ListCommand, MoveArgs};
pub use config::{find_work_dir, get_db_path, init_work_dir, Config};
pub use error::{Error, Result};

/// Execute a parsed command line.
///
/// Changes into `-C <path>` first, then installs logging (to the project's
/// configured log file when one is set) and dispatches.
pub fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)?;
    }
    let log_file = find_work_dir()
        .ok()
        .and_then(|work_dir| Config::load(&work_dir).ok().and_then(|c| c.log_path(&work_dir)));
    logging::init(cli.verbose, log_file.as_deref());

    dispatch(cli.command)
}

/// Route a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Add { title, list, notes, due } => commands::add::run(title, list.list, notes, due),
        Command::Show { list, open } => commands::show::run(list.list, open),
        Command::Edit { id, title, notes, due } => commands::edit::run(id, title, notes, due),
        Command::Indent { id, out } => commands::arrange::indent(id, out),
        Command::Move { id, target } => commands::arrange::move_task(id, target.target()),
        Command::Done { ids } => commands::lifecycle::done(&ids),
        Command::Reopen { ids } => commands::lifecycle::reopen(&ids),
        Command::Rm { ids } => commands::lifecycle::remove(&ids),
        Command::Init { remote, token } => commands::init::run(remote, token),
        Command::Lists => commands::list::show_all(),
        Command::List(cmd) => match cmd {
            ListCommand::Add { title } => commands::list::add(&title),
            ListCommand::Rename { list, title } => commands::list::rename(&list, &title),
            ListCommand::Remove { list } => commands::list::remove(&list),
            ListCommand::Use { list } => commands::list::select(&list),
        },
        Command::Sync { quiet } => commands::sync::run(quiet),
        Command::Status => commands::status::run(),
    }
}
