//! Session Store
//!
//! Branch name -> session cache over the per-branch files, plus the
//! repository index of known branch names. The files are the source of truth
//! across restarts; the in-memory map only caches what was touched this run.

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use branchtabs_storage::{StorageDir, INDEX_FILE_NAME};
use branchtabs_tabs::TabState;

use crate::error::SessionError;
use crate::record::IndexRecord;
use crate::session::BranchSession;
use crate::Result;

/// Cached session handle. Repeated lookups of one branch share the same `Arc`.
pub type SharedSession = Arc<RwLock<BranchSession>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedSession {
    pub tab_count: usize,
    /// The branch was not in the persisted index yet; call
    /// `save_metadata_index` to record it.
    pub introduced: bool,
}

pub struct SessionStore {
    /// In-memory session cache
    sessions: Arc<RwLock<HashMap<String, SharedSession>>>,
    /// Names as of the last index read or write
    indexed: Arc<RwLock<HashSet<String>>>,
    /// Workspace storage directory
    storage: StorageDir,
}

impl SessionStore {
    pub fn new(storage: StorageDir) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            indexed: Arc::new(RwLock::new(HashSet::new())),
            storage,
        }
    }

    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let storage = StorageDir::open(path).await?;
        Ok(Self::new(storage))
    }

    pub fn storage(&self) -> &StorageDir {
        &self.storage
    }

    /// Cached session for `branch_name`, loading it from disk or starting an
    /// empty one on first use.
    pub async fn get_session(&self, branch_name: &str) -> Result<SharedSession> {
        if branch_name.is_empty() {
            return Err(SessionError::EmptyName);
        }

        let cached = self.sessions.read().get(branch_name).cloned();
        if let Some(session) = cached {
            return Ok(session);
        }

        let loaded = match BranchSession::load(&self.storage, branch_name).await {
            Ok(session) => {
                tracing::debug!(
                    branch = %branch_name,
                    tab_count = session.tab_count(),
                    "Loaded branch session"
                );
                session
            }
            Err(SessionError::NotFound(_)) => {
                tracing::debug!(branch = %branch_name, "Starting empty session for new branch");
                BranchSession::new(branch_name)
            }
            Err(e) => return Err(e),
        };

        // Another caller may have filled the slot while we were reading
        let mut cache = self.sessions.write();
        let session = cache
            .entry(branch_name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(loaded)));
        Ok(Arc::clone(session))
    }

    /// Replace a branch's tabs and persist the session
    pub async fn save_session(&self, branch_name: &str, tabs: Vec<TabState>) -> Result<SavedSession> {
        let shared = self.get_session(branch_name).await?;

        let mut snapshot = {
            let mut session = shared.write();
            session.set_tabs(tabs);
            session.clone()
        };
        snapshot.save(&self.storage).await?;
        shared.write().saved_at = snapshot.saved_at;

        let introduced = !self.indexed.read().contains(branch_name);

        tracing::info!(
            branch = %branch_name,
            tab_count = snapshot.tab_count(),
            introduced,
            "Saved session"
        );

        Ok(SavedSession {
            tab_count: snapshot.tab_count(),
            introduced,
        })
    }

    /// Persist every cached session. Sessions never loaded this run are left
    /// alone on disk. All sessions are attempted; the first failure is returned.
    pub async fn save_all_sessions(&self) -> Result<usize> {
        let cached: Vec<SharedSession> = self.sessions.read().values().cloned().collect();

        let mut saved = 0;
        let mut first_error = None;
        for shared in cached {
            let mut snapshot = shared.read().clone();
            match snapshot.save(&self.storage).await {
                Ok(()) => {
                    shared.write().saved_at = snapshot.saved_at;
                    saved += 1;
                }
                Err(e) => {
                    tracing::error!(
                        branch = %snapshot.branch_name,
                        error = %e,
                        "Failed to save session"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(saved),
        }
    }

    /// Read the repository index and cache every branch it lists.
    ///
    /// A missing index means no branches are known yet. A branch whose file
    /// cannot be read is left out of the cache so it is not overwritten at
    /// shutdown.
    pub async fn load_metadata_index(&self) -> Result<Vec<String>> {
        let index: IndexRecord = self
            .storage
            .read_json(INDEX_FILE_NAME)
            .await?
            .unwrap_or_default();

        let mut loaded = Vec::with_capacity(index.branches.len());
        for name in index.branches {
            if name.is_empty() {
                continue;
            }

            self.indexed.write().insert(name.clone());
            match self.get_session(&name).await {
                Ok(_) => loaded.push(name),
                Err(e) => {
                    tracing::warn!(branch = %name, error = %e, "Skipping unreadable session")
                }
            }
        }

        tracing::info!(branch_count = loaded.len(), "Loaded repository index");

        Ok(loaded)
    }

    /// Write the index of known branch names
    pub async fn save_metadata_index(&self) -> Result<()> {
        let branches = self.known_branches();
        let record = IndexRecord {
            branches: branches.clone(),
        };
        self.storage.write_json(INDEX_FILE_NAME, &record).await?;

        *self.indexed.write() = branches.into_iter().collect();

        tracing::debug!(branch_count = record.branches.len(), "Saved repository index");

        Ok(())
    }

    /// Shutdown flush: every cached session, then the index
    pub async fn flush(&self) -> Result<()> {
        let saved = self.save_all_sessions().await;
        let indexed = self.save_metadata_index().await;
        saved?;
        indexed
    }

    /// Drop a branch from the cache; the next lookup reads it from disk
    pub fn invalidate(&self, branch_name: &str) -> bool {
        self.sessions.write().remove(branch_name).is_some()
    }

    pub fn contains(&self, branch_name: &str) -> bool {
        self.sessions.read().contains_key(branch_name)
    }

    /// Cached and indexed branch names, sorted
    pub fn known_branches(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.sessions.read().keys().cloned().collect();
        names.extend(self.indexed.read().iter().cloned());
        names.into_iter().collect()
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            indexed: Arc::clone(&self.indexed),
            storage: self.storage.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchtabs_storage::branch_file_name;

    fn tab(path: &str) -> TabState {
        TabState::new(path).unwrap()
    }

    #[tokio::test]
    async fn test_get_session_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).await.unwrap();

        let first = store.get_session("main").await.unwrap();
        let second = store.get_session("main").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.read().is_empty());

        // Nothing is written just by looking a branch up
        assert!(!dir.path().join(branch_file_name("main")).exists());
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).await.unwrap();

        assert!(matches!(
            store.get_session("").await,
            Err(SessionError::EmptyName)
        ));
    }

    #[tokio::test]
    async fn test_save_session_replaces_tabs() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).await.unwrap();

        let saved = store
            .save_session("main", vec![tab("/a"), tab("/b")])
            .await
            .unwrap();
        assert_eq!(saved.tab_count, 2);
        assert!(saved.introduced);

        store.save_session("main", vec![tab("/c")]).await.unwrap();

        let session = store.get_session("main").await.unwrap();
        assert_eq!(session.read().tabs, vec![tab("/c")]);

        store.invalidate("main");
        let reloaded = store.get_session("main").await.unwrap();
        assert_eq!(reloaded.read().tabs, vec![tab("/c")]);
    }

    #[tokio::test]
    async fn test_introduced_clears_after_index_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).await.unwrap();

        assert!(store.save_session("main", vec![]).await.unwrap().introduced);
        store.save_metadata_index().await.unwrap();
        assert!(!store.save_session("main", vec![]).await.unwrap().introduced);
    }

    #[tokio::test]
    async fn test_index_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = SessionStore::open(dir.path()).await.unwrap();
            store
                .save_session("feature/new", vec![tab("/repo/x.rs").with_cursor_line(2)])
                .await
                .unwrap();
            store.save_metadata_index().await.unwrap();
        }

        let store = SessionStore::open(dir.path()).await.unwrap();
        let loaded = store.load_metadata_index().await.unwrap();
        assert_eq!(loaded, vec!["feature/new".to_string()]);
        assert!(store.contains("feature/new"));

        let session = store.get_session("feature/new").await.unwrap();
        assert_eq!(session.read().tabs, vec![tab("/repo/x.rs").with_cursor_line(2)]);
    }

    #[tokio::test]
    async fn test_missing_index_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).await.unwrap();

        assert!(store.load_metadata_index().await.unwrap().is_empty());
        assert!(store.known_branches().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_index_propagates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE_NAME), "{\"branches\": [").unwrap();
        let store = SessionStore::open(dir.path()).await.unwrap();

        assert!(matches!(
            store.load_metadata_index().await,
            Err(SessionError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_indexed_branch_without_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(INDEX_FILE_NAME),
            r#"{ "branches": ["ghost", "broken"] }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join(branch_file_name("broken")), "nope").unwrap();
        let store = SessionStore::open(dir.path()).await.unwrap();

        let loaded = store.load_metadata_index().await.unwrap();
        assert_eq!(loaded, vec!["ghost".to_string()]);
        assert!(!store.contains("broken"));
        // Still listed so the index does not forget it
        assert_eq!(store.known_branches(), vec!["broken", "ghost"]);
    }

    #[tokio::test]
    async fn test_flush_writes_cached_sessions_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).await.unwrap();

        {
            let session = store.get_session("main").await.unwrap();
            session.write().add_tab(tab("/a"));
        }
        store.flush().await.unwrap();

        assert!(dir.path().join(branch_file_name("main")).exists());
        assert!(!dir.path().join(branch_file_name("other")).exists());

        let fresh = SessionStore::open(dir.path()).await.unwrap();
        assert_eq!(fresh.load_metadata_index().await.unwrap(), vec!["main"]);
        let session = fresh.get_session("main").await.unwrap();
        assert_eq!(session.read().tabs, vec![tab("/a")]);
    }
}
