//! Workspace configuration

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the per-branch files and the repository index
    pub storage_dir: PathBuf,
    /// Branch name used when the VCS reports no branch (detached HEAD)
    pub detached_branch_name: String,
    /// Save and restore automatically when the branch changes
    pub auto_save_restore: bool,
    /// Show informational notices in the editor
    pub notify: bool,
    /// How long activation waits for the VCS to become ready
    pub vcs_ready_timeout_ms: u64,
}

impl Config {
    pub fn new(storage_dir: PathBuf) -> Self {
        Self {
            storage_dir,
            detached_branch_name: "unknown".to_string(),
            auto_save_restore: true,
            notify: true,
            vcs_ready_timeout_ms: 10_000,
        }
    }

    /// Storage scoped to one workspace root
    pub fn for_workspace(root: &Path) -> Self {
        Self::new(
            Self::data_dir()
                .join("workspaces")
                .join(workspace_dir_name(root)),
        )
    }

    /// Settings JSON from the host; absent keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.detached_branch_name.trim().is_empty() {
            return Err(CoreError::Config(
                "detachedBranchName cannot be empty".to_string(),
            ));
        }
        if self.storage_dir.as_os_str().is_empty() {
            return Err(CoreError::Config("storageDir cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn vcs_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.vcs_ready_timeout_ms)
    }

    pub fn data_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os("BRANCHTABS_DATA_DIR") {
            return PathBuf::from(dir);
        }

        platform_data_dir(|key| std::env::var_os(key))
            .map(|d| d.join("branchtabs"))
            .unwrap_or_else(|| PathBuf::from(".branchtabs"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir().join("default"))
    }
}

fn workspace_dir_name(root: &Path) -> String {
    let digest = format!("{:x}", Sha256::digest(root.to_string_lossy().as_bytes()));
    let name: String = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if name.is_empty() {
        digest[..16].to_string()
    } else {
        format!("{}-{}", name, &digest[..16])
    }
}

/// Per-user local data directory, resolved from environment variables
fn platform_data_dir(var: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
    let home = || var("HOME").map(PathBuf::from);

    if cfg!(target_os = "windows") {
        var("LOCALAPPDATA").map(PathBuf::from)
    } else if cfg!(target_os = "macos") {
        home().map(|h| h.join("Library/Application Support"))
    } else {
        var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| home().map(|h| h.join(".local/share")))
    }
}
