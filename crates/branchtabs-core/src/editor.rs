//! Host editor seam

use async_trait::async_trait;

use crate::error::EditorError;

/// A file tab as the editor reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTab {
    pub path: String,
    pub pinned: bool,
    /// Tab group (editor split) the tab lives in
    pub group: usize,
}

impl OpenTab {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            pinned: false,
            group: 0,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub fn in_group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }
}

/// Window, tab and document operations of the host editor.
///
/// Async methods are suspension points; everything else must answer from
/// state the editor already holds.
#[async_trait]
pub trait Editor: Send + Sync {
    /// File tabs of every group, in display order
    fn open_tabs(&self) -> Vec<OpenTab>;

    /// Cursor line for a path shown in a visible editor
    fn cursor_line(&self, path: &str) -> Option<u32>;

    /// Load a path as a text document without showing it
    async fn open_text_document(&self, path: &str) -> Result<(), EditorError>;

    /// Show an already opened text document as a non-preview tab
    async fn show_text_document(&self, path: &str) -> Result<(), EditorError>;

    /// Open through the editor's generic path (images, binaries, custom viewers)
    async fn open_generic(&self, path: &str) -> Result<(), EditorError>;

    /// Place the cursor at the start of `line`
    async fn set_selection(&self, path: &str, line: u32) -> Result<(), EditorError>;

    async fn set_pinned(&self, path: &str, pinned: bool) -> Result<(), EditorError>;

    /// Close every open editor
    async fn close_all(&self) -> Result<(), EditorError>;

    /// Brief, non-blocking informational notice
    fn show_info(&self, message: &str);
}
