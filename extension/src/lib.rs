//! Branchtabs - Editor Integration
//!
//! - Activation waits once for the VCS to be ready, then subscribes to it
//! - Repository changes resolve to a branch name and drive the coordinator
//! - Two commands save or restore the current branch's tabs on demand
//! - Deactivation flushes every cached session and the repository index
//!
//! The host installs logging with [`init_logging`] before activating.

mod commands;
mod state;
mod watcher;

pub use commands::{CommandResult, RestoredTabsInfo, SavedTabsInfo, RESTORE_TABS, SAVE_TABS};
pub use state::Extension;

pub use branchtabs_core::{init_logging, Config, CoreError, Result, SwitchOutcome};
