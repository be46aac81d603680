// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs for CLI commands.
//!
//! These structs are used with `#[command(flatten)]` to reduce duplication
//! across commands that take the same selectors.

use clap::Args;
use tm_core::{MoveTarget, TaskId};

/// List selector; falls back to `default_list` from the config.
#[derive(Args, Clone, Debug, Default)]
pub struct ListArg {
    /// List ID or title
    #[arg(long = "list", short = 'l', value_name = "LIST")]
    pub list: Option<String>,
}

/// Destination of `tm move`.
#[derive(Args, Clone, Debug, Default)]
#[group(required = true, multiple = false)]
pub struct MoveArgs {
    /// Place directly before this task, under its parent
    #[arg(long, value_name = "ID")]
    pub before: Option<TaskId>,

    /// Place last at the top level
    #[arg(long)]
    pub end: bool,
}

impl MoveArgs {
    pub fn target(&self) -> MoveTarget {
        match self.before {
            Some(id) => MoveTarget::Before(id),
            None => MoveTarget::End,
        }
    }
}
