//! Extension lifecycle
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use branchtabs_core::{
    BranchSwitchCoordinator, Config, CoreError, Editor, Result, SessionStore, SwitchOutcome, Vcs,
    VcsError,
};

use crate::commands::{self, CommandResult, RESTORE_TABS, SAVE_TABS};
use crate::watcher;

/// Live extension: coordinator, repository subscription and commands
pub struct Extension {
    config: Config,
    vcs: Arc<dyn Vcs>,
    coordinator: BranchSwitchCoordinator,
    watcher: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
    outcomes: watch::Receiver<Option<SwitchOutcome>>,
}

impl Extension {
    /// Wait for the VCS, load the index and start following branch changes.
    ///
    /// Fails without touching the editor when the VCS is missing or does
    /// not become ready in time.
    pub async fn activate(config: Config, editor: Arc<dyn Editor>, vcs: Arc<dyn Vcs>) -> Result<Self> {
        config.validate()?;

        let timeout = config.vcs_ready_timeout();
        let ready = match tokio::time::timeout(timeout, vcs.wait_ready()).await {
            Ok(ready) => ready.map_err(CoreError::from),
            Err(_) => Err(CoreError::Vcs(VcsError::Unavailable(format!(
                "repository not ready after {}ms",
                config.vcs_ready_timeout_ms
            )))),
        };
        if let Err(e) = ready {
            tracing::error!(error = %e, "Version control unavailable, branch tabs disabled");
            return Err(e);
        }

        let store = SessionStore::open(&config.storage_dir).await?;
        let known = store.load_metadata_index().await?;
        tracing::debug!(count = known.len(), "Loaded branch index");

        let coordinator = BranchSwitchCoordinator::from_config(&config, store, editor);

        // Subscribe before reading HEAD so no checkout slips between the two
        let changes = vcs.subscribe();
        let branch = watcher::resolve_branch(vcs.as_ref(), &config.detached_branch_name);
        coordinator.initialize(&branch);

        let (outcomes_tx, outcomes) = watch::channel(None);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = watcher::spawn(
            coordinator.clone(),
            Arc::clone(&vcs),
            changes,
            config.detached_branch_name.clone(),
            outcomes_tx,
            shutdown_rx,
        );

        tracing::info!(
            branch = %branch,
            storage = %config.storage_dir.display(),
            "Branch tabs activated"
        );

        Ok(Self {
            config,
            vcs,
            coordinator,
            watcher: handle,
            shutdown,
            outcomes,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn coordinator(&self) -> &BranchSwitchCoordinator {
        &self.coordinator
    }

    /// Branch the VCS reports right now
    pub fn current_branch(&self) -> String {
        watcher::resolve_branch(self.vcs.as_ref(), &self.config.detached_branch_name)
    }

    /// Latest automatic switch outcome
    pub fn outcomes(&self) -> watch::Receiver<Option<SwitchOutcome>> {
        self.outcomes.clone()
    }

    pub async fn save_tabs(&self) -> CommandResult<commands::SavedTabsInfo> {
        commands::tabs::save_tabs(self).await
    }

    pub async fn restore_tabs(&self) -> CommandResult<commands::RestoredTabsInfo> {
        commands::tabs::restore_tabs(self).await
    }

    /// Run a registered command by id
    pub async fn execute_command(&self, id: &str) -> CommandResult<serde_json::Value> {
        match id {
            SAVE_TABS => to_value(self.save_tabs().await),
            RESTORE_TABS => to_value(self.restore_tabs().await),
            _ => CommandResult::err(format!("Unknown command: {}", id)),
        }
    }

    /// Stop following the repository and write everything out.
    ///
    /// Change events already delivered are still handled, and a switch in
    /// progress finishes before the flush.
    pub async fn deactivate(self) -> Result<()> {
        self.shutdown.send_replace(true);
        if let Err(e) = self.watcher.await {
            tracing::warn!(error = %e, "Repository watcher did not stop cleanly");
        }

        self.coordinator.shutdown().await?;
        tracing::info!("Branch tabs deactivated");
        Ok(())
    }
}

fn to_value<T: serde::Serialize>(result: CommandResult<T>) -> CommandResult<serde_json::Value> {
    if !result.success {
        return CommandResult::err(result.error.unwrap_or_default());
    }

    match serde_json::to_value(result.data) {
        Ok(value) => CommandResult::ok(value),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchtabs_core::testing::{MemoryEditor, MemoryVcs};
    use branchtabs_core::{OpenTab, StorageDir};
    use std::time::Duration;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config::new(dir.path().join("sessions"))
    }

    async fn next_outcome(ext: &Extension) -> SwitchOutcome {
        let mut rx = ext.outcomes();
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|o| o.is_some()),
        )
        .await
        .expect("no outcome")
        .unwrap()
        .clone();
        outcome.unwrap()
    }

    #[tokio::test]
    async fn test_activate_without_vcs_fails() {
        let dir = TempDir::new().unwrap();
        let editor = Arc::new(MemoryEditor::new());
        let vcs = Arc::new(MemoryVcs::unavailable());

        let result = Extension::activate(config_in(&dir), editor.clone(), vcs).await;
        assert!(matches!(result, Err(CoreError::Vcs(VcsError::Unavailable(_)))));
        assert!(editor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_activate_times_out() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.vcs_ready_timeout_ms = 20;
        let editor = Arc::new(MemoryEditor::new());
        let vcs = Arc::new(MemoryVcs::pending(Some("main")));

        let result = Extension::activate(config, editor, vcs).await;
        assert!(matches!(result, Err(CoreError::Vcs(VcsError::Unavailable(_)))));
    }

    #[tokio::test]
    async fn test_activate_waits_for_ready() {
        let dir = TempDir::new().unwrap();
        let editor = Arc::new(MemoryEditor::new());
        let vcs = Arc::new(MemoryVcs::pending(Some("main")));

        let ready = Arc::clone(&vcs);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            ready.mark_ready();
        });

        let ext = Extension::activate(config_in(&dir), editor, vcs).await.unwrap();
        assert_eq!(ext.coordinator().current_branch().as_deref(), Some("main"));
        ext.deactivate().await.unwrap();
    }

    #[tokio::test]
    async fn test_checkout_switches_tabs() {
        let dir = TempDir::new().unwrap();
        let editor = Arc::new(MemoryEditor::new());
        editor.add_text_file("/repo/a.txt", 50);
        editor.user_opens(OpenTab::new("/repo/a.txt"), Some(12));
        let vcs = Arc::new(MemoryVcs::new(Some("main")));

        let ext = Extension::activate(config_in(&dir), editor.clone(), vcs.clone())
            .await
            .unwrap();

        vcs.checkout(Some("feature"));
        match next_outcome(&ext).await {
            SwitchOutcome::Switched(report) => {
                assert_eq!(report.from, "main");
                assert_eq!(report.to, "feature");
                assert_eq!(report.saved.map(|s| s.tab_count), Some(1));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(editor.tabs().is_empty());
        assert_eq!(ext.coordinator().current_branch().as_deref(), Some("feature"));

        let storage = StorageDir::open(dir.path().join("sessions")).await.unwrap();
        let index: Option<serde_json::Value> = storage.read_json("repository.json").await.unwrap();
        let index = index.unwrap();
        let branches = index["branches"].as_array().unwrap();
        assert!(branches.contains(&serde_json::json!("main")));

        ext.deactivate().await.unwrap();
    }

    #[tokio::test]
    async fn test_deactivate_during_switch_keeps_outgoing_tabs() {
        let dir = TempDir::new().unwrap();
        let editor = Arc::new(MemoryEditor::new());
        editor.add_text_file("/repo/a.txt", 40);
        editor.user_opens(OpenTab::new("/repo/a.txt"), Some(7));
        let vcs = Arc::new(MemoryVcs::new(Some("main")));

        let ext = Extension::activate(config_in(&dir), editor.clone(), vcs.clone())
            .await
            .unwrap();

        vcs.checkout(Some("feature"));
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        ext.deactivate().await.unwrap();

        assert!(editor.tabs().is_empty());

        let store = SessionStore::open(dir.path().join("sessions")).await.unwrap();
        let main = store.get_session("main").await.unwrap();
        let tabs = main.read().tabs.clone();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].path, "/repo/a.txt");
        assert_eq!(tabs[0].cursor_line, 7);

        let leftovers: Vec<String> = std::fs::read_dir(dir.path().join("sessions"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);
    }

    #[tokio::test]
    async fn test_deactivate_right_after_checkout_handles_it() {
        let dir = TempDir::new().unwrap();
        let editor = Arc::new(MemoryEditor::new());
        editor.add_text_file("/repo/b.txt", 10);
        editor.user_opens(OpenTab::new("/repo/b.txt"), Some(2));
        let vcs = Arc::new(MemoryVcs::new(Some("main")));

        let ext = Extension::activate(config_in(&dir), editor.clone(), vcs.clone())
            .await
            .unwrap();

        vcs.checkout(Some("feature"));
        ext.deactivate().await.unwrap();

        let store = SessionStore::open(dir.path().join("sessions")).await.unwrap();
        let main = store.get_session("main").await.unwrap();
        assert_eq!(main.read().tab_count(), 1);
    }

    #[tokio::test]
    async fn test_detached_head_uses_sentinel() {
        let dir = TempDir::new().unwrap();
        let editor = Arc::new(MemoryEditor::new());
        let vcs = Arc::new(MemoryVcs::new(None));

        let ext = Extension::activate(config_in(&dir), editor, vcs.clone())
            .await
            .unwrap();
        assert_eq!(ext.coordinator().current_branch().as_deref(), Some("unknown"));
        assert_eq!(ext.current_branch(), "unknown");

        vcs.checkout(Some("main"));
        match next_outcome(&ext).await {
            SwitchOutcome::Switched(report) => assert_eq!(report.from, "unknown"),
            other => panic!("unexpected outcome: {:?}", other),
        }

        ext.deactivate().await.unwrap();
    }

    #[tokio::test]
    async fn test_change_without_checkout_ignored() {
        let dir = TempDir::new().unwrap();
        let editor = Arc::new(MemoryEditor::new());
        editor.add_text_file("/repo/a.txt", 5);
        editor.user_opens(OpenTab::new("/repo/a.txt"), None);
        let vcs = Arc::new(MemoryVcs::new(Some("main")));

        let ext = Extension::activate(config_in(&dir), editor.clone(), vcs.clone())
            .await
            .unwrap();

        vcs.touch();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(ext.outcomes().borrow().is_none());
        assert_eq!(editor.tabs().len(), 1);
        assert!(editor.calls().is_empty());

        ext.deactivate().await.unwrap();
    }

    #[tokio::test]
    async fn test_commands_round_trip() {
        let dir = TempDir::new().unwrap();
        let editor = Arc::new(MemoryEditor::new());
        editor.add_text_file("/repo/a.txt", 30);
        editor.add_text_file("/repo/b.txt", 30);
        editor.user_opens(OpenTab::new("/repo/a.txt"), Some(4));
        editor.user_opens(OpenTab::new("/repo/b.txt").pinned(), None);
        let vcs = Arc::new(MemoryVcs::new(Some("main")));

        let ext = Extension::activate(config_in(&dir), editor.clone(), vcs)
            .await
            .unwrap();

        let saved = ext.execute_command(SAVE_TABS).await;
        assert!(saved.success);
        let data = saved.data.unwrap();
        assert_eq!(data["branch"], "main");
        assert_eq!(data["tab_count"], 2);

        let restored = ext.restore_tabs().await;
        assert!(restored.success);
        let info = restored.data.unwrap();
        assert_eq!(info.branch, "main");
        assert_eq!(info.restored, vec!["/repo/a.txt", "/repo/b.txt"]);
        assert!(info.skipped.is_empty());

        assert_eq!(editor.tab("/repo/a.txt").unwrap().cursor_line, Some(4));
        assert!(editor.tab("/repo/b.txt").unwrap().pinned);

        ext.deactivate().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let dir = TempDir::new().unwrap();
        let editor = Arc::new(MemoryEditor::new());
        let vcs = Arc::new(MemoryVcs::new(Some("main")));

        let ext = Extension::activate(config_in(&dir), editor, vcs).await.unwrap();

        let result = ext.execute_command("branchSwitch.nope").await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("branchSwitch.nope"));

        ext.deactivate().await.unwrap();
    }

    #[tokio::test]
    async fn test_deactivate_flushes_sessions() {
        let dir = TempDir::new().unwrap();
        let editor = Arc::new(MemoryEditor::new());
        let vcs = Arc::new(MemoryVcs::new(Some("main")));

        let ext = Extension::activate(config_in(&dir), editor, vcs).await.unwrap();
        ext.coordinator().store().get_session("main").await.unwrap();
        ext.deactivate().await.unwrap();

        let storage = StorageDir::open(dir.path().join("sessions")).await.unwrap();
        let index: Option<serde_json::Value> = storage.read_json("repository.json").await.unwrap();
        assert_eq!(index.unwrap()["branches"], serde_json::json!(["main"]));
    }
}
