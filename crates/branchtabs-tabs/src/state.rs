//! Document classification
//!
//! The editor cannot tell us directly whether a tab holds a text document.
//! Classification answers one of three ways:
//! ```text
//! Text     opened as a text document
//! Binary   the text open path refused it (images, archives, ...)
//! Unknown  no answer (path vanished, probe not attempted)
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Binary,
    Unknown,
}

impl DocumentKind {
    /// Value stored in `isTextDoc`.
    ///
    /// Only a positive binary answer leaves the text path; unknown falls back
    /// to the schema default.
    pub fn is_text_document(&self) -> bool {
        !matches!(self, DocumentKind::Binary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Text => "text",
            DocumentKind::Binary => "binary",
            DocumentKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(DocumentKind::Text),
            "binary" => Ok(DocumentKind::Binary),
            "unknown" => Ok(DocumentKind::Unknown),
            _ => Err(format!("Unknown document kind: {}", s)),
        }
    }
}
