//! Branch switch coordination
//!
//! ```text
//! Uninitialized --first branch seen--> Tracking(branch)
//! Tracking(a)   --change to b != a --> capture a's tabs
//!                                       current = b
//!                                       restore b  ||  save a
//! ```
//! Switches, manual saves and manual restores run one at a time. Change
//! events that pile up behind a running switch collapse into one switch to
//! the latest branch.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use branchtabs_session::{SavedSession, SessionStore};
use branchtabs_tabs::TabState;

use crate::classify::{DocumentClassifier, ProbeClassifier};
use crate::config::Config;
use crate::editor::Editor;
use crate::error::EditorError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTab {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub branch: String,
    /// Paths reopened, in session order
    pub restored: Vec<String>,
    /// Paths that could not be reopened
    pub skipped: Vec<SkippedTab>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReport {
    pub from: String,
    pub to: String,
    /// Outgoing save result; `None` when the save failed
    pub saved: Option<SavedSession>,
    pub save_error: Option<String>,
    pub restore: RestoreReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// First branch observed; nothing saved or restored
    Adopted(String),
    /// Reported branch is already current
    Unchanged(String),
    /// A later change event superseded this one
    Coalesced,
    /// Identity moved with automatic save/restore turned off
    Tracked { from: String, to: String },
    Switched(SwitchReport),
}

pub struct BranchSwitchCoordinator {
    store: SessionStore,
    editor: Arc<dyn Editor>,
    classifier: Arc<dyn DocumentClassifier>,
    /// Branch the editor's tabs currently belong to
    current_branch: Arc<RwLock<Option<String>>>,
    /// Latest requested branch not yet picked up by a switch
    pending: Arc<Mutex<Option<String>>>,
    /// Serializes switches, saves and restores
    switch_lock: Arc<tokio::sync::Mutex<()>>,
    auto_save_restore: bool,
    notify: bool,
}

impl BranchSwitchCoordinator {
    pub fn new(store: SessionStore, editor: Arc<dyn Editor>) -> Self {
        let classifier = Arc::new(ProbeClassifier::new(Arc::clone(&editor)));

        Self {
            store,
            editor,
            classifier,
            current_branch: Arc::new(RwLock::new(None)),
            pending: Arc::new(Mutex::new(None)),
            switch_lock: Arc::new(tokio::sync::Mutex::new(())),
            auto_save_restore: true,
            notify: true,
        }
    }

    pub fn from_config(config: &Config, store: SessionStore, editor: Arc<dyn Editor>) -> Self {
        Self::new(store, editor)
            .with_auto_save_restore(config.auto_save_restore)
            .with_notifications(config.notify)
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn DocumentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_auto_save_restore(mut self, enabled: bool) -> Self {
        self.auto_save_restore = enabled;
        self
    }

    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notify = enabled;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn current_branch(&self) -> Option<String> {
        self.current_branch.read().clone()
    }

    /// Adopt the branch detected at startup
    pub fn initialize(&self, branch: &str) {
        *self.current_branch.write() = Some(branch.to_string());
        tracing::info!(branch = %branch, "Tracking branch");
    }

    /// Snapshot of the editor's file tabs in display order
    pub async fn capture_open_tabs(&self) -> Vec<TabState> {
        let open_tabs = self.editor.open_tabs();
        let mut tabs = Vec::with_capacity(open_tabs.len());

        for open_tab in open_tabs {
            let tab = match TabState::new(open_tab.path.as_str()) {
                Ok(tab) => tab,
                Err(_) => continue,
            };

            let kind = self.classifier.classify(&open_tab.path).await;
            let line = self.editor.cursor_line(&open_tab.path).unwrap_or(0);

            tracing::debug!(
                path = %open_tab.path,
                kind = %kind,
                line,
                pinned = open_tab.pinned,
                group = open_tab.group,
                "Captured tab"
            );

            tabs.push(
                tab.with_cursor_line(line)
                    .with_document_kind(kind)
                    .with_pinned(open_tab.pinned),
            );
        }

        tabs
    }

    /// React to the VCS reporting `new_branch` as active
    pub async fn handle_branch_change(&self, new_branch: &str) -> Result<SwitchOutcome> {
        *self.pending.lock() = Some(new_branch.to_string());
        let _guard = self.switch_lock.lock().await;

        let target = self.pending.lock().take();
        let Some(target) = target else {
            tracing::debug!(branch = %new_branch, "Branch change superseded");
            return Ok(SwitchOutcome::Coalesced);
        };

        let previous = self.current_branch();
        let previous = match previous {
            None => {
                self.initialize(&target);
                return Ok(SwitchOutcome::Adopted(target));
            }
            Some(previous) if previous == target => {
                return Ok(SwitchOutcome::Unchanged(target));
            }
            Some(previous) => previous,
        };

        if !self.auto_save_restore {
            *self.current_branch.write() = Some(target.clone());
            tracing::info!(from = %previous, to = %target, "Branch changed");
            return Ok(SwitchOutcome::Tracked {
                from: previous,
                to: target,
            });
        }

        tracing::info!(from = %previous, to = %target, "Switching branch");

        let tabs = self.capture_open_tabs().await;
        *self.current_branch.write() = Some(target.clone());

        let restore = self.restore_session(&target, true);
        let save = self.persist(&previous, tabs);
        let (restored, saved) = tokio::join!(restore, save);

        let (saved, save_error) = match saved {
            Ok(saved) => {
                self.notice(format!("Saved tabs opened for {}", previous));
                (Some(saved), None)
            }
            Err(e) => {
                tracing::warn!(
                    branch = %previous,
                    error = %e,
                    "Failed to save tabs for branch being left"
                );
                (None, Some(e.to_string()))
            }
        };
        let restore = restored?;

        Ok(SwitchOutcome::Switched(SwitchReport {
            from: previous,
            to: target,
            saved,
            save_error,
            restore,
        }))
    }

    /// Save the editor's tabs under `branch` on demand
    pub async fn save_state(&self, branch: &str) -> Result<SavedSession> {
        let _guard = self.switch_lock.lock().await;

        let tabs = self.capture_open_tabs().await;
        let saved = self.persist(branch, tabs).await?;
        self.notice(format!("Saved tabs opened for {}", branch));

        Ok(saved)
    }

    /// Replace the editor's tabs with `branch`'s saved session on demand.
    ///
    /// An empty session leaves the editor as it is.
    pub async fn restore_state(&self, branch: &str) -> Result<RestoreReport> {
        let _guard = self.switch_lock.lock().await;
        self.restore_session(branch, false).await
    }

    /// Write every cached session and the index
    pub async fn shutdown(&self) -> Result<()> {
        let _guard = self.switch_lock.lock().await;
        self.store.flush().await?;
        tracing::info!("Flushed branch sessions");
        Ok(())
    }

    async fn persist(&self, branch: &str, tabs: Vec<TabState>) -> Result<SavedSession> {
        let saved = self.store.save_session(branch, tabs).await?;
        if saved.introduced {
            self.store.save_metadata_index().await?;
        }
        Ok(saved)
    }

    async fn restore_session(&self, branch: &str, close_when_empty: bool) -> Result<RestoreReport> {
        let session = self.store.get_session(branch).await?;
        let tabs = session.read().tabs.clone();

        let mut report = RestoreReport {
            branch: branch.to_string(),
            ..Default::default()
        };

        if tabs.is_empty() {
            self.notice(format!("No saved tabs found for branch: {}", branch));
            if !close_when_empty {
                return Ok(report);
            }
        }

        if let Err(e) = self.editor.close_all().await {
            tracing::warn!(branch = %branch, error = %e, "Failed to close open editors");
        }

        for tab in &tabs {
            match self.restore_tab(tab).await {
                Ok(()) => report.restored.push(tab.path.clone()),
                Err(e) => {
                    tracing::warn!(path = %tab.path, error = %e, "Skipping file that failed to open");
                    report.skipped.push(SkippedTab {
                        path: tab.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            branch = %branch,
            restored = report.restored.len(),
            skipped = report.skipped.len(),
            "Restored session"
        );

        if !tabs.is_empty() {
            self.notice(format!("Restored last tabs opened for {}", branch));
        }
        if !report.skipped.is_empty() {
            self.notice(format!(
                "Could not reopen {} file(s) for {}",
                report.skipped.len(),
                branch
            ));
        }

        Ok(report)
    }

    async fn restore_tab(&self, tab: &TabState) -> std::result::Result<(), EditorError> {
        let path = tab.path.as_str();

        if tab.is_text_document {
            self.editor.open_text_document(path).await?;
            self.editor.show_text_document(path).await?;

            if let Err(e) = self.editor.set_selection(path, tab.cursor_line).await {
                tracing::debug!(path = %path, line = tab.cursor_line, error = %e, "Cursor not restored");
            }
        } else {
            self.editor.open_generic(path).await?;
        }

        // Pin only once the content is open
        if tab.pinned {
            if let Err(e) = self.editor.set_pinned(path, true).await {
                tracing::warn!(path = %path, error = %e, "Failed to pin tab");
            }
        }

        tracing::debug!(path = %path, "Restored tab");

        Ok(())
    }

    fn notice(&self, message: String) {
        if self.notify {
            self.editor.show_info(&message);
        }
    }
}

impl Clone for BranchSwitchCoordinator {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            editor: Arc::clone(&self.editor),
            classifier: Arc::clone(&self.classifier),
            current_branch: Arc::clone(&self.current_branch),
            pending: Arc::clone(&self.pending),
            switch_lock: Arc::clone(&self.switch_lock),
            auto_save_restore: self.auto_save_restore,
            notify: self.notify,
        }
    }
}
