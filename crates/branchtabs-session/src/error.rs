//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No saved session for branch: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] branchtabs_storage::StorageError),

    #[error("Branch name cannot be empty")]
    EmptyName,
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }
}
