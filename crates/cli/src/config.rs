// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration management.
//!
//! Configuration is stored in `.taskmirror/config.toml` and includes:
//! - `remote`: where the shared remote lives and the token to present
//! - `sync`: pass tunables (fudge offset, page size, field limits)
//! - `default_list`: list used when a command names none
//! - `log_file`: optional log destination instead of stderr

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use tm_core::merge::{FieldLimits, MAX_NOTES_LENGTH, MAX_TITLE_LENGTH};
use tm_core::DEFAULT_FUDGE_MS;

use crate::error::{Error, Result};
use crate::sync::{SyncSettings, DEFAULT_PAGE_SIZE};

const WORK_DIR_NAME: &str = ".taskmirror";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "tasks.db";
const SYNC_LOCK_FILE_NAME: &str = "sync.lock";
const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Project configuration stored in `.taskmirror/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Id of the list used when a command names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_list: Option<String>,
    /// Log destination, relative to the project root unless absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    /// Remote service (optional; without it the replica is local-only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Remote service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Directory of the shared remote (relative to project root or absolute).
    pub path: String,
    /// Token presented on every remote call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Sync tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Offset added to last-sync stamps, in milliseconds (default: 1000).
    #[serde(default = "default_fudge_ms")]
    pub fudge_ms: i64,
    /// Items requested per listing page (default: 100).
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_title_len")]
    pub max_title_len: usize,
    #[serde(default = "default_max_notes_len")]
    pub max_notes_len: usize,
    /// Run a sync after every command that changed a task.
    #[serde(default)]
    pub auto: bool,
}

fn default_fudge_ms() -> i64 {
    DEFAULT_FUDGE_MS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_title_len() -> usize {
    MAX_TITLE_LENGTH
}

fn default_max_notes_len() -> usize {
    MAX_NOTES_LENGTH
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            fudge_ms: default_fudge_ms(),
            page_size: default_page_size(),
            max_title_len: default_max_title_len(),
            max_notes_len: default_max_notes_len(),
            auto: false,
        }
    }
}

impl SyncConfig {
    pub fn settings(&self) -> SyncSettings {
        SyncSettings {
            fudge: Duration::milliseconds(self.fudge_ms),
            limits: FieldLimits { title: self.max_title_len, notes: self.max_notes_len },
        }
    }
}

/// Resolves `path` against the project root that holds `work_dir`.
fn resolve(work_dir: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        work_dir.parent().unwrap_or(work_dir).join(candidate)
    }
}

impl Config {
    /// Loads configuration from the given `.taskmirror/` directory.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Saves configuration to the given `.taskmirror/` directory.
    pub fn save(&self, work_dir: &Path) -> Result<()> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Resolved remote directory, if a remote is configured.
    pub fn remote_dir(&self, work_dir: &Path) -> Option<PathBuf> {
        self.remote.as_ref().map(|r| resolve(work_dir, &r.path))
    }

    pub fn log_path(&self, work_dir: &Path) -> Option<PathBuf> {
        self.log_file.as_deref().map(|p| resolve(work_dir, p))
    }
}

/// Find the .taskmirror directory by walking up from the current directory
pub fn find_work_dir() -> Result<PathBuf> {
    let mut current = std::env::current_dir()?;
    loop {
        let work_dir = current.join(WORK_DIR_NAME);
        if work_dir.is_dir() {
            return Ok(work_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

pub fn get_db_path(work_dir: &Path) -> PathBuf {
    work_dir.join(DB_FILE_NAME)
}

/// Lock file held for the duration of a sync session.
pub fn get_sync_lock_path(work_dir: &Path) -> PathBuf {
    work_dir.join(SYNC_LOCK_FILE_NAME)
}

/// Initialize a new .taskmirror directory at the given path
pub fn init_work_dir(path: &Path, config: &Config) -> Result<PathBuf> {
    let work_dir = path.join(WORK_DIR_NAME);

    if work_dir.exists() {
        return Err(Error::AlreadyInitialized(work_dir.display().to_string()));
    }

    fs::create_dir_all(&work_dir)?;
    config.save(&work_dir)?;

    Ok(work_dir)
}

/// Write `.gitignore` inside the work directory.
///
/// The database and lock are per replica; only the config may be shared.
pub fn write_gitignore(work_dir: &Path) -> Result<()> {
    let content = "# Replica state\ntasks.db\ntasks.db-*\n\n# Runtime\nsync.lock\n";
    fs::write(work_dir.join(GITIGNORE_FILE_NAME), content)?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
