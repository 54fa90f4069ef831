//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] branchtabs_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] branchtabs_session::SessionError),

    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    #[error("VCS error: {0}")]
    Vcs(#[from] VcsError),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("Cannot open {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Not a text document: {0}")]
    NotText(String),

    #[error("No open tab for {0}")]
    NoSuchTab(String),

    #[error("Editor operation failed: {0}")]
    Operation(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VcsError {
    #[error("VCS integration unavailable: {0}")]
    Unavailable(String),

    #[error("No repository in workspace")]
    NoRepository,
}
