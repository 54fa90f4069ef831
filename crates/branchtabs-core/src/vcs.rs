//! Version control seam

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::VcsError;

/// Fired whenever repository state changes. Not every change is a branch
/// switch; subscribers compare the resolved branch name themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryChanged;

#[async_trait]
pub trait Vcs: Send + Sync {
    /// Resolves once the repository can be queried.
    ///
    /// Fails when no repository or VCS integration is available.
    async fn wait_ready(&self) -> Result<(), VcsError>;

    /// Active branch, `None` when HEAD is detached or unresolvable
    fn current_branch(&self) -> Option<String>;

    fn subscribe(&self) -> broadcast::Receiver<RepositoryChanged>;
}
