// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote task service backed by a shared directory.
//!
//! State lives in `<dir>/remote.json`. Every call takes an exclusive lock on
//! `<dir>/remote.lock`, loads the state, applies the call through
//! [`MemoryRemote`] and writes the state back when it changed. Several
//! replicas pointing at the same directory therefore share one remote.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tm_core::SystemClock;

use super::memory::{MemoryRemote, RemoteState, DEFAULT_PAGE_SIZE};
use super::remote::{
    NewRemoteTask, Page, RemoteClient, RemoteError, RemoteList, RemoteResult, RemoteTask,
    TaskPatch, TaskQuery,
};

const STATE_FILE: &str = "remote.json";
const LOCK_FILE: &str = "remote.lock";

fn io_error(context: &str, e: impl std::fmt::Display) -> RemoteError {
    RemoteError::Io(format!("{}: {}", context, e))
}

/// Directory-backed [`RemoteClient`].
#[derive(Debug, Clone)]
pub struct FileRemote {
    dir: PathBuf,
    token: Option<String>,
    page_size: usize,
}

impl FileRemote {
    /// Opens the remote at `dir`, creating the directory if needed.
    ///
    /// The first caller to write state fixes the token every later caller
    /// must present.
    pub fn open(dir: &Path, token: Option<String>) -> RemoteResult<Self> {
        fs::create_dir_all(dir).map_err(|e| io_error("create remote dir", e))?;
        Ok(FileRemote { dir: dir.to_path_buf(), token, page_size: DEFAULT_PAGE_SIZE })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load(&self) -> RemoteResult<RemoteState> {
        let path = self.dir.join(STATE_FILE);
        if !path.exists() {
            return Ok(RemoteState { token: self.token.clone(), ..RemoteState::default() });
        }
        let content = fs::read_to_string(&path).map_err(|e| io_error("read remote state", e))?;
        serde_json::from_str(&content).map_err(|e| io_error("parse remote state", e))
    }

    fn store(&self, state: &RemoteState) -> RemoteResult<()> {
        let path = self.dir.join(STATE_FILE);
        let tmp = self.dir.join(format!("{}.tmp", STATE_FILE));
        let content =
            serde_json::to_string_pretty(state).map_err(|e| io_error("encode remote state", e))?;
        fs::write(&tmp, content).map_err(|e| io_error("write remote state", e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error("replace remote state", e))
    }

    fn lock(&self) -> RemoteResult<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))
            .map_err(|e| io_error("open remote lock", e))?;
        file.lock_exclusive().map_err(|e| io_error("lock remote", e))?;
        Ok(file)
    }

    fn with_remote<T, F>(&mut self, op: F) -> RemoteResult<T>
    where
        F: FnOnce(&mut MemoryRemote<SystemClock>) -> RemoteResult<T>,
    {
        let _lock = self.lock()?;
        let before = self.load()?;
        let mut remote = MemoryRemote::from_state(before.clone(), SystemClock)
            .with_page_size(self.page_size)
            .with_token(self.token.clone());
        let result = op(&mut remote)?;
        if remote.state() != &before {
            self.store(remote.state())?;
        }
        Ok(result)
    }
}

impl RemoteClient for FileRemote {
    fn list_lists(&mut self, page_token: Option<&str>) -> RemoteResult<Page<RemoteList>> {
        self.with_remote(|r| r.list_lists(page_token))
    }

    fn list_tasks(
        &mut self,
        list_id: &str,
        query: &TaskQuery,
        page_token: Option<&str>,
    ) -> RemoteResult<Page<RemoteTask>> {
        self.with_remote(|r| r.list_tasks(list_id, query, page_token))
    }

    fn create_task(
        &mut self,
        list_id: &str,
        task: &NewRemoteTask,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> RemoteResult<RemoteTask> {
        self.with_remote(|r| r.create_task(list_id, task, parent, previous))
    }

    fn update_task(&mut self, list_id: &str, patch: &TaskPatch) -> RemoteResult<RemoteTask> {
        self.with_remote(|r| r.update_task(list_id, patch))
    }

    fn move_task(
        &mut self,
        list_id: &str,
        task_id: &str,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> RemoteResult<RemoteTask> {
        self.with_remote(|r| r.move_task(list_id, task_id, parent, previous))
    }

    fn delete_task(&mut self, list_id: &str, task_id: &str) -> RemoteResult<()> {
        self.with_remote(|r| r.delete_task(list_id, task_id))
    }

    fn create_list(&mut self, title: &str) -> RemoteResult<RemoteList> {
        self.with_remote(|r| r.create_list(title))
    }

    fn rename_list(&mut self, list_id: &str, title: &str) -> RemoteResult<RemoteList> {
        self.with_remote(|r| r.rename_list(list_id, title))
    }

    fn delete_list(&mut self, list_id: &str) -> RemoteResult<()> {
        self.with_remote(|r| r.delete_list(list_id))
    }
}

#[cfg(test)]
#[path = "file_remote_tests.rs"]
mod tests;
