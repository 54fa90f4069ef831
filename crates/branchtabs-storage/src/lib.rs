//! Branchtabs Storage Layer
//!
//! Plain JSON files in one workspace-scoped directory.
//! A missing file is a normal first-run condition and reads as `None`.
//! Every write replaces the whole file atomically.

mod directory;
mod error;
mod paths;

pub use directory::StorageDir;
pub use error::StorageError;
pub use paths::{branch_file_name, INDEX_FILE_NAME};

pub type Result<T> = std::result::Result<T, StorageError>;
