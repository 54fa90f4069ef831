//! Branchtabs Core
//!
//! Saves the set of open files when the active branch changes and puts back
//! the set saved for the branch being entered. The editor and the VCS are
//! reached only through the traits in [`Editor`] and [`Vcs`].

mod classify;
mod config;
mod coordinator;
mod editor;
mod error;
mod vcs;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use classify::{DocumentClassifier, ProbeClassifier};
pub use config::Config;
pub use coordinator::{BranchSwitchCoordinator, RestoreReport, SkippedTab, SwitchOutcome, SwitchReport};
pub use editor::{Editor, OpenTab};
pub use error::{CoreError, EditorError, VcsError};
pub use vcs::{RepositoryChanged, Vcs};

// Re-export core components
pub use branchtabs_session::{BranchSession, SavedSession, SessionError, SessionStore, SharedSession};
pub use branchtabs_storage::{StorageDir, StorageError};
pub use branchtabs_tabs::{DocumentKind, TabError, TabState};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
