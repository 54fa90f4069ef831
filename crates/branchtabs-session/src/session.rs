//! Branch session data structure

use chrono::{DateTime, Utc};

use branchtabs_storage::{branch_file_name, StorageDir};
use branchtabs_tabs::TabState;

use crate::error::SessionError;
use crate::record::SessionRecord;
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct BranchSession {
    /// Branch this session belongs to; also its key in the store
    pub branch_name: String,
    /// Open files in tab display order at capture time
    pub tabs: Vec<TabState>,
    /// Reserved for stash tracking; carried through persistence untouched
    pub stash_reference: Option<String>,
    /// When the session was last written to disk
    pub saved_at: Option<DateTime<Utc>>,
}

impl BranchSession {
    pub fn new(branch_name: impl Into<String>) -> Self {
        Self {
            branch_name: branch_name.into(),
            tabs: Vec::new(),
            stash_reference: None,
            saved_at: None,
        }
    }

    /// Append a tab. Duplicates are not filtered here.
    pub fn add_tab(&mut self, tab: TabState) {
        self.tabs.push(tab);
    }

    /// Remove every tab with the given path
    pub fn remove_tab(&mut self, path: &str) {
        self.tabs.retain(|tab| tab.path != path);
    }

    /// Replace all tabs. A repeated path keeps its first position and the
    /// attributes of its last occurrence.
    pub fn set_tabs(&mut self, tabs: Vec<TabState>) {
        let mut deduped: Vec<TabState> = Vec::with_capacity(tabs.len());
        for tab in tabs {
            match deduped.iter_mut().find(|existing| existing.path == tab.path) {
                Some(existing) => *existing = tab,
                None => deduped.push(tab),
            }
        }
        self.tabs = deduped;
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            name: self.branch_name.clone(),
            tabs: self.tabs.clone(),
            stash_reference: self.stash_reference.clone(),
            saved_at: self.saved_at,
        }
    }

    /// Build a session from a record read for `branch_name`.
    ///
    /// The requested name wins over the name inside the record, and entries
    /// without a path are dropped.
    pub fn from_record(branch_name: &str, record: SessionRecord) -> Self {
        if record.name != branch_name {
            tracing::warn!(
                branch = %branch_name,
                recorded = %record.name,
                "Session record name does not match its branch"
            );
        }

        let total = record.tabs.len();
        let tabs: Vec<TabState> = record.tabs.into_iter().filter(TabState::is_valid).collect();
        if tabs.len() != total {
            tracing::warn!(
                branch = %branch_name,
                dropped = total - tabs.len(),
                "Dropped session entries without a path"
            );
        }

        Self {
            branch_name: branch_name.to_string(),
            tabs,
            stash_reference: record.stash_reference,
            saved_at: record.saved_at,
        }
    }

    /// Write the whole session to its per-branch file
    pub async fn save(&mut self, storage: &StorageDir) -> Result<()> {
        let file_name = branch_file_name(&self.branch_name);
        let saved_at = Utc::now();

        let mut record = self.to_record();
        record.saved_at = Some(saved_at);
        storage.write_json(&file_name, &record).await?;
        self.saved_at = Some(saved_at);

        tracing::debug!(
            branch = %self.branch_name,
            file = %file_name,
            tab_count = self.tab_count(),
            "Saved branch session"
        );

        Ok(())
    }

    /// Read a branch's session. A branch with no file yields
    /// `SessionError::NotFound`; see [`BranchSession::load_or_new`].
    pub async fn load(storage: &StorageDir, branch_name: &str) -> Result<Self> {
        let file_name = branch_file_name(branch_name);
        let record: Option<SessionRecord> = storage.read_json(&file_name).await?;

        match record {
            Some(record) => Ok(Self::from_record(branch_name, record)),
            None => Err(SessionError::NotFound(branch_name.to_string())),
        }
    }

    /// Like `load`, but a branch without a saved session starts empty
    pub async fn load_or_new(storage: &StorageDir, branch_name: &str) -> Result<Self> {
        match Self::load(storage, branch_name).await {
            Err(SessionError::NotFound(_)) => Ok(Self::new(branch_name)),
            other => other,
        }
    }
}
