// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub fn tm() -> Command {
    let mut cmd = cargo_bin_cmd!("tm");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Helper to create an initialized temp directory without a remote
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    tm().arg("init").current_dir(temp.path()).assert().success();
    temp
}

/// Runs `tm` in `dir` and returns stdout.
pub fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = tm().args(args).current_dir(dir).assert().success().get_output().stdout.clone();
    String::from_utf8_lossy(&output).to_string()
}

/// Two replicas, `a` and `b`, sharing the remote in `shared/`.
pub struct Pair {
    pub root: TempDir,
}

impl Pair {
    pub fn new() -> Self {
        Self::with_tokens(None, None)
    }

    pub fn with_tokens(a: Option<&str>, b: Option<&str>) -> Self {
        let root = TempDir::new().unwrap();
        for (name, token) in [("a", a), ("b", b)] {
            let dir = root.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            let mut cmd = tm();
            cmd.args(["init", "--remote", "../shared"]);
            if let Some(token) = token {
                cmd.args(["--token", token]);
            }
            cmd.current_dir(&dir).assert().success();
            // Commands run back to back; stamp syncs without an offset so an
            // edit right after a sync still counts as newer.
            let config = dir.join(".taskmirror/config.toml");
            let content = fs::read_to_string(&config).unwrap();
            assert!(content.contains("fudge_ms = 1000"));
            fs::write(&config, content.replace("fudge_ms = 1000", "fudge_ms = 0")).unwrap();
        }
        Pair { root }
    }

    pub fn a(&self) -> PathBuf {
        self.root.path().join("a")
    }

    pub fn b(&self) -> PathBuf {
        self.root.path().join("b")
    }
}

/// Task id of the row whose title is `title` in `tm show` output.
pub fn id_of(show_output: &str, title: &str) -> String {
    show_output
        .lines()
        .find(|line| line.ends_with(&format!("] {}", title)))
        .and_then(|line| line.split_whitespace().next())
        .unwrap()
        .to_string()
}

/// A replica with a remote and a default list named Inbox.
///
/// Returns the temp root (keep it alive) and the project directory.
pub fn init_with_inbox() -> (TempDir, PathBuf) {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("project");
    fs::create_dir_all(&dir).unwrap();
    tm().args(["init", "--remote", "../shared"]).current_dir(&dir).assert().success();
    tm().args(["list", "add", "Inbox"]).current_dir(&dir).assert().success();
    (root, dir)
}

/// Adds a task to the default list and returns its id.
pub fn add_task(dir: &Path, title: &str) -> String {
    run_ok(dir, &["add", title]).trim().to_string()
}
