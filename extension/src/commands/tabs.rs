//! Save / restore tab commands
use serde::{Deserialize, Serialize};

use branchtabs_core::{RestoreReport, SavedSession};

use super::CommandResult;
use crate::state::Extension;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTabsInfo {
    pub branch: String,
    pub tab_count: usize,
}

impl SavedTabsInfo {
    fn from_saved(branch: String, saved: SavedSession) -> Self {
        Self {
            branch,
            tab_count: saved.tab_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoredTabsInfo {
    pub branch: String,
    pub restored: Vec<String>,
    pub skipped: Vec<String>,
}

impl From<RestoreReport> for RestoredTabsInfo {
    fn from(report: RestoreReport) -> Self {
        Self {
            branch: report.branch,
            restored: report.restored,
            skipped: report.skipped.into_iter().map(|s| s.path).collect(),
        }
    }
}

pub async fn save_tabs(extension: &Extension) -> CommandResult<SavedTabsInfo> {
    let branch = extension.current_branch();

    match extension.coordinator().save_state(&branch).await {
        Ok(saved) => CommandResult::ok(SavedTabsInfo::from_saved(branch, saved)),
        Err(e) => {
            tracing::error!(branch = %branch, error = %e, "Save tabs command failed");
            CommandResult::err(e.to_string())
        }
    }
}

pub async fn restore_tabs(extension: &Extension) -> CommandResult<RestoredTabsInfo> {
    let branch = extension.current_branch();

    match extension.coordinator().restore_state(&branch).await {
        Ok(report) => CommandResult::ok(report.into()),
        Err(e) => {
            tracing::error!(branch = %branch, error = %e, "Restore tabs command failed");
            CommandResult::err(e.to_string())
        }
    }
}
