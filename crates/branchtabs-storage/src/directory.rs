//! Storage directory handle and file operations

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::StorageError;
use crate::Result;

pub struct StorageDir {
    root: Arc<PathBuf>,
}

impl StorageDir {
    /// Open (and create if needed) the storage directory
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::io("creating storage directory", &root, e))?;

        tracing::debug!(root = %root.display(), "Opened storage directory");

        Ok(Self {
            root: Arc::new(root),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, file_name: &str) -> Result<PathBuf> {
        validate_file_name(file_name)?;
        Ok(self.root.join(file_name))
    }

    /// Read and parse a JSON file. A missing file yields `Ok(None)`.
    pub async fn read_json<T: DeserializeOwned>(&self, file_name: &str) -> Result<Option<T>> {
        let path = self.path_for(file_name)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io("reading", &path, e)),
        };

        let value = serde_json::from_slice(&bytes).map_err(|e| StorageError::json(&path, e))?;
        Ok(Some(value))
    }

    /// Serialize `value` and replace the whole file.
    ///
    /// The data goes to a temp file in the same directory which is then
    /// renamed over the target, so readers see either the old or the new file.
    pub async fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<()> {
        let path = self.path_for(file_name)?;
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| StorageError::json(&path, e))?;

        let tmp_path = self
            .root
            .join(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

        if let Err(e) = tokio::fs::write(&tmp_path, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StorageError::io("writing", &tmp_path, e));
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StorageError::io("replacing", &path, e));
        }

        tracing::trace!(path = %path.display(), bytes = bytes.len(), "Wrote storage file");

        Ok(())
    }
}

impl Clone for StorageDir {
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
        }
    }
}

impl std::fmt::Debug for StorageDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageDir")
            .field("root", &self.root.display())
            .finish()
    }
}

fn validate_file_name(file_name: &str) -> Result<()> {
    let plain = !file_name.is_empty()
        && file_name != "."
        && file_name != ".."
        && !file_name.contains(['/', '\\', '\0']);

    if plain {
        Ok(())
    } else {
        Err(StorageError::InvalidFileName(file_name.to_string()))
    }
}
