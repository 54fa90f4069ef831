//! On-disk record shapes
//!
//! Session file (one per branch):
//! ```text
//! { "name": "feature/x", "tabs": [ { "path": ..., "cursorPosition": ..., "isTextDoc": ..., "pinned": ... } ] }
//! ```
//! Repository index (one per workspace):
//! ```text
//! { "branches": [ "main", "feature/x" ] }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use branchtabs_tabs::TabState;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default)]
    pub name: String,
    /// Older files called this list `files`
    #[serde(default, alias = "files")]
    pub tabs: Vec<TabState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stash_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    #[serde(default)]
    pub branches: Vec<String>,
}
