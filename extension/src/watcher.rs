//! Repository change subscription

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use branchtabs_core::{BranchSwitchCoordinator, RepositoryChanged, SwitchOutcome, Vcs};

/// Branch name to track, falling back to the detached sentinel
pub(crate) fn resolve_branch(vcs: &dyn Vcs, detached_branch_name: &str) -> String {
    vcs.current_branch()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| detached_branch_name.to_string())
}

pub(crate) fn spawn(
    coordinator: BranchSwitchCoordinator,
    vcs: Arc<dyn Vcs>,
    mut changes: broadcast::Receiver<RepositoryChanged>,
    detached_branch_name: String,
    outcomes: watch::Sender<Option<SwitchOutcome>>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            // Queued events are drained before shutdown is honored; a switch
            // in progress always runs to completion.
            let event = tokio::select! {
                biased;
                event = changes.recv() => event,
                _ = shutdown.changed() => break,
            };

            match event {
                Ok(RepositoryChanged) => {}
                // Only the latest state matters
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Repository change events dropped");
                }
                Err(RecvError::Closed) => break,
            }

            let branch = resolve_branch(vcs.as_ref(), &detached_branch_name);
            if coordinator.current_branch().as_deref() == Some(branch.as_str()) {
                continue;
            }

            match coordinator.handle_branch_change(&branch).await {
                Ok(outcome) => {
                    tracing::debug!(branch = %branch, outcome = ?outcome, "Handled branch change");
                    outcomes.send_replace(Some(outcome));
                }
                Err(e) => {
                    tracing::error!(branch = %branch, error = %e, "Branch change failed");
                }
            }
        }

        tracing::info!("Repository change subscription closed");
    })
}
