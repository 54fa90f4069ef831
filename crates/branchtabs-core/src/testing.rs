//! In-memory collaborators
//!
//! `MemoryEditor` keeps a file table and a tab strip; `MemoryVcs` holds a
//! branch name and a change channel. Both record enough to assert on call
//! order and on what the coordinator did to the editor.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use tokio::sync::{broadcast, watch};

use crate::editor::{Editor, OpenTab};
use crate::error::{EditorError, VcsError};
use crate::vcs::{RepositoryChanged, Vcs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Text { lines: u32 },
    Binary,
}

/// How a tab was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenedAs {
    Text,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryTab {
    pub path: String,
    pub pinned: bool,
    pub group: usize,
    /// `None` for tabs without a text cursor
    pub cursor_line: Option<u32>,
    pub opened_as: OpenedAs,
}

/// One recorded editor operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCall {
    OpenText(String),
    ShowText(String),
    OpenGeneric(String),
    SetSelection(String, u32),
    SetPinned(String, bool),
    CloseAll,
}

#[derive(Default)]
struct EditorState {
    files: HashMap<String, FileKind>,
    loaded: HashSet<String>,
    tabs: Vec<MemoryTab>,
    notices: Vec<String>,
    calls: Vec<EditorCall>,
    fail_close_all: bool,
}

#[derive(Default)]
pub struct MemoryEditor {
    state: Mutex<EditorState>,
}

impl MemoryEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_text_file(&self, path: &str, lines: u32) {
        self.state
            .lock()
            .files
            .insert(path.to_string(), FileKind::Text { lines });
    }

    pub fn add_binary_file(&self, path: &str) {
        self.state
            .lock()
            .files
            .insert(path.to_string(), FileKind::Binary);
    }

    /// Delete a file from the backing table; open tabs stay
    pub fn remove_file(&self, path: &str) {
        let mut state = self.state.lock();
        state.files.remove(path);
        state.loaded.remove(path);
    }

    /// Put a tab on the strip the way a user would, bypassing the call log
    pub fn user_opens(&self, tab: OpenTab, cursor_line: Option<u32>) {
        let mut state = self.state.lock();
        let opened_as = match state.files.get(&tab.path) {
            Some(FileKind::Binary) => OpenedAs::Generic,
            _ => OpenedAs::Text,
        };
        state.tabs.push(MemoryTab {
            path: tab.path,
            pinned: tab.pinned,
            group: tab.group,
            cursor_line,
            opened_as,
        });
    }

    pub fn fail_close_all(&self, fail: bool) {
        self.state.lock().fail_close_all = fail;
    }

    pub fn tabs(&self) -> Vec<MemoryTab> {
        self.state.lock().tabs.clone()
    }

    pub fn tab(&self, path: &str) -> Option<MemoryTab> {
        self.state.lock().tabs.iter().find(|t| t.path == path).cloned()
    }

    pub fn notices(&self) -> Vec<String> {
        self.state.lock().notices.clone()
    }

    pub fn calls(&self) -> Vec<EditorCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn record(&self, call: EditorCall) {
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl Editor for MemoryEditor {
    fn open_tabs(&self) -> Vec<OpenTab> {
        self.state
            .lock()
            .tabs
            .iter()
            .map(|t| OpenTab {
                path: t.path.clone(),
                pinned: t.pinned,
                group: t.group,
            })
            .collect()
    }

    fn cursor_line(&self, path: &str) -> Option<u32> {
        self.state
            .lock()
            .tabs
            .iter()
            .find(|t| t.path == path)
            .and_then(|t| t.cursor_line)
    }

    async fn open_text_document(&self, path: &str) -> Result<(), EditorError> {
        self.record(EditorCall::OpenText(path.to_string()));
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        match state.files.get(path) {
            Some(FileKind::Text { .. }) => {
                state.loaded.insert(path.to_string());
                Ok(())
            }
            Some(FileKind::Binary) => Err(EditorError::NotText(path.to_string())),
            None => Err(EditorError::Open {
                path: path.to_string(),
                reason: "file not found".to_string(),
            }),
        }
    }

    async fn show_text_document(&self, path: &str) -> Result<(), EditorError> {
        self.record(EditorCall::ShowText(path.to_string()));
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        if !state.loaded.contains(path) {
            return Err(EditorError::Operation(format!("{} is not loaded", path)));
        }
        if !state.tabs.iter().any(|t| t.path == path) {
            state.tabs.push(MemoryTab {
                path: path.to_string(),
                pinned: false,
                group: 0,
                cursor_line: Some(0),
                opened_as: OpenedAs::Text,
            });
        }
        Ok(())
    }

    async fn open_generic(&self, path: &str) -> Result<(), EditorError> {
        self.record(EditorCall::OpenGeneric(path.to_string()));
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        if !state.files.contains_key(path) {
            return Err(EditorError::Open {
                path: path.to_string(),
                reason: "file not found".to_string(),
            });
        }
        if !state.tabs.iter().any(|t| t.path == path) {
            state.tabs.push(MemoryTab {
                path: path.to_string(),
                pinned: false,
                group: 0,
                cursor_line: None,
                opened_as: OpenedAs::Generic,
            });
        }
        Ok(())
    }

    async fn set_selection(&self, path: &str, line: u32) -> Result<(), EditorError> {
        self.record(EditorCall::SetSelection(path.to_string(), line));
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        let last_line = match state.files.get(path) {
            Some(FileKind::Text { lines }) => lines.saturating_sub(1),
            _ => return Err(EditorError::NotText(path.to_string())),
        };
        let tab = state
            .tabs
            .iter_mut()
            .find(|t| t.path == path)
            .ok_or_else(|| EditorError::NoSuchTab(path.to_string()))?;
        tab.cursor_line = Some(line.min(last_line));
        Ok(())
    }

    async fn set_pinned(&self, path: &str, pinned: bool) -> Result<(), EditorError> {
        self.record(EditorCall::SetPinned(path.to_string(), pinned));
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        let tab = state
            .tabs
            .iter_mut()
            .find(|t| t.path == path)
            .ok_or_else(|| EditorError::NoSuchTab(path.to_string()))?;
        tab.pinned = pinned;
        Ok(())
    }

    async fn close_all(&self) -> Result<(), EditorError> {
        self.record(EditorCall::CloseAll);
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        if state.fail_close_all {
            return Err(EditorError::Operation("close all editors failed".to_string()));
        }
        state.tabs.clear();
        Ok(())
    }

    fn show_info(&self, message: &str) {
        self.state.lock().notices.push(message.to_string());
    }
}

pub struct MemoryVcs {
    available: bool,
    branch: RwLock<Option<String>>,
    ready: watch::Sender<bool>,
    changes: broadcast::Sender<RepositoryChanged>,
}

impl MemoryVcs {
    /// Ready repository on `branch`
    pub fn new(branch: Option<&str>) -> Self {
        let vcs = Self::pending(branch);
        vcs.mark_ready();
        vcs
    }

    /// Repository that becomes ready on `mark_ready`
    pub fn pending(branch: Option<&str>) -> Self {
        let (ready, _) = watch::channel(false);
        let (changes, _) = broadcast::channel(16);
        Self {
            available: true,
            branch: RwLock::new(branch.map(str::to_string)),
            ready,
            changes,
        }
    }

    /// No VCS integration at all
    pub fn unavailable() -> Self {
        let mut vcs = Self::pending(None);
        vcs.available = false;
        vcs
    }

    pub fn mark_ready(&self) {
        self.ready.send_replace(true);
    }

    /// Move HEAD and fire a change event. `None` detaches HEAD.
    pub fn checkout(&self, branch: Option<&str>) {
        *self.branch.write() = branch.map(str::to_string);
        self.touch();
    }

    /// Fire a change event without moving HEAD
    pub fn touch(&self) {
        let _ = self.changes.send(RepositoryChanged);
    }
}

#[async_trait]
impl Vcs for MemoryVcs {
    async fn wait_ready(&self) -> Result<(), VcsError> {
        if !self.available {
            return Err(VcsError::Unavailable("git integration not installed".to_string()));
        }

        let mut ready = self.ready.subscribe();
        ready
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| VcsError::NoRepository)
    }

    fn current_branch(&self) -> Option<String> {
        self.branch.read().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<RepositoryChanged> {
        self.changes.subscribe()
    }
}
