//! Text vs. binary classification of open tabs

use async_trait::async_trait;
use std::sync::Arc;

use branchtabs_tabs::DocumentKind;

use crate::editor::Editor;
use crate::error::EditorError;

#[async_trait]
pub trait DocumentClassifier: Send + Sync {
    async fn classify(&self, path: &str) -> DocumentKind;
}

/// Classifies by asking the editor to open the path as text.
///
/// A refusal to treat the file as text means binary; any other failure
/// (missing file, permission) leaves the answer unknown.
pub struct ProbeClassifier {
    editor: Arc<dyn Editor>,
}

impl ProbeClassifier {
    pub fn new(editor: Arc<dyn Editor>) -> Self {
        Self { editor }
    }
}

#[async_trait]
impl DocumentClassifier for ProbeClassifier {
    async fn classify(&self, path: &str) -> DocumentKind {
        match self.editor.open_text_document(path).await {
            Ok(()) => DocumentKind::Text,
            Err(EditorError::NotText(_)) => DocumentKind::Binary,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Could not classify document");
                DocumentKind::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryEditor;

    #[tokio::test]
    async fn test_probe_results() {
        let editor = Arc::new(MemoryEditor::new());
        editor.add_text_file("/repo/a.txt", 20);
        editor.add_binary_file("/repo/logo.png");
        let classifier = ProbeClassifier::new(editor.clone());

        assert_eq!(classifier.classify("/repo/a.txt").await, DocumentKind::Text);
        assert_eq!(classifier.classify("/repo/logo.png").await, DocumentKind::Binary);
        assert_eq!(classifier.classify("/repo/gone.txt").await, DocumentKind::Unknown);

        // Probing loads documents but never adds tabs
        assert!(editor.open_tabs().is_empty());
    }
}
