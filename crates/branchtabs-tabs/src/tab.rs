//! Tab data structure
//!
//! Persisted shape:
//! ```text
//! { "path": "...", "cursorPosition": 3, "isTextDoc": true, "pinned": false }
//! ```
//! Every field except `path` is optional on read so records written by older
//! versions keep loading.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TabError;
use crate::state::DocumentKind;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabState {
    /// Absolute file path, unique within a session
    #[serde(default)]
    pub path: String,
    /// Zero-based line of the cursor; the column is not kept
    #[serde(
        rename = "cursorPosition",
        default,
        deserialize_with = "lenient_line"
    )]
    pub cursor_line: u32,
    /// False for binary or otherwise non-editable content
    #[serde(rename = "isTextDoc", default = "default_true")]
    pub is_text_document: bool,
    #[serde(default)]
    pub pinned: bool,
}

impl TabState {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(TabError::EmptyPath);
        }

        Ok(Self {
            path,
            cursor_line: 0,
            is_text_document: true,
            pinned: false,
        })
    }

    pub fn with_cursor_line(mut self, line: u32) -> Self {
        self.cursor_line = line;
        self
    }

    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    pub fn with_document_kind(mut self, kind: DocumentKind) -> Self {
        self.is_text_document = kind.is_text_document();
        self
    }

    /// A deserialized tab may carry an empty path; such entries are unusable
    pub fn is_valid(&self) -> bool {
        !self.path.is_empty()
    }
}

fn default_true() -> bool {
    true
}

/// Accepts any JSON number (or null) and clamps it into a line index.
fn lenient_line<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let line = value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .map(|n| n.clamp(0.0, f64::from(u32::MAX)) as u32)
        .unwrap_or(0);
    Ok(line)
}
