//! Manual commands
//!
//! Both commands derive the target branch from the VCS at invocation time.

pub mod tabs;

use serde::Serialize;

pub use tabs::{RestoredTabsInfo, SavedTabsInfo};

pub const SAVE_TABS: &str = "branchSwitch.saveTabs";
pub const RESTORE_TABS: &str = "branchSwitch.restoreTabs";

#[derive(Debug, Serialize)]
pub struct CommandResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}
