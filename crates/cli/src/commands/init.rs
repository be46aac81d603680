// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use tm_core::Database;

use crate::config::{get_db_path, init_work_dir, write_gitignore, Config, RemoteConfig};
use crate::error::Result;

pub fn run(remote: Option<String>, token: Option<String>) -> Result<()> {
    let target_path = std::env::current_dir()?;
    let has_remote = remote.is_some();
    let work_dir = run_impl(&target_path, remote, token)?;

    println!("Initialized taskmirror replica at {}", work_dir.display());
    if has_remote {
        println!("Run 'tm sync' to fetch lists, or 'tm list add <title>' to create one.");
    }
    Ok(())
}

/// Creates `.taskmirror/` with its config, database and `.gitignore`.
pub(crate) fn run_impl(path: &Path, remote: Option<String>, token: Option<String>) -> Result<PathBuf> {
    let config = Config {
        remote: remote.map(|path| RemoteConfig { path, token }),
        ..Config::default()
    };
    let work_dir = init_work_dir(path, &config)?;
    Database::open(&get_db_path(&work_dir))?;
    write_gitignore(&work_dir)?;
    Ok(work_dir)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
