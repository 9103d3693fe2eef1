//! Source-attachment action resolution
//!
//! Maps a cited source document to the single affordance the message view
//! should draw for it: open in the embedded viewer, open a raw preview,
//! trigger a download, or nothing (badge-only).

use crate::messages::SourceDocument;

/// Base location of the file-serving collaborator.
pub const DEFAULT_DOWNLOAD_BASE: &str = "http://localhost:8000/api/v1";

/// The one action a source card offers, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceAction {
    /// Open the in-app document viewer, scrolled to `page` and searching
    /// for `search_text` so the matching excerpt can be highlighted.
    OpenViewer {
        path: String,
        page: Option<u32>,
        search_text: String,
    },
    /// Open the raw document in an external preview (browser tab).
    OpenPreview { url: String },
    /// Hand the document URL to the platform download mechanism.
    Download { url: String },
}

/// Decides the user-facing action for a source document.
///
/// Resolution is pure: the same document and the same resolver
/// configuration always produce the same decision.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    download_base: String,
    viewer_available: bool,
}

impl SourceResolver {
    pub fn new(download_base: impl Into<String>) -> Self {
        Self {
            download_base: download_base.into(),
            viewer_available: false,
        }
    }

    /// Declare whether the embedded-viewer collaborator is wired up.
    /// Without it, PDF sources degrade to badge-only display.
    pub fn with_viewer(mut self, available: bool) -> Self {
        self.viewer_available = available;
        self
    }

    pub fn viewer_available(&self) -> bool {
        self.viewer_available
    }

    /// Retrieval URL for a document name on the file-serving endpoint.
    pub fn download_url(&self, name: &str) -> String {
        format!(
            "{}/files/download/{}",
            self.download_base.trim_end_matches('/'),
            urlencoding::encode(name)
        )
    }

    /// Pick the action for one source document. First match wins; at most
    /// one action per document.
    pub fn resolve(&self, doc: &SourceDocument) -> Option<SourceAction> {
        match doc.file_extension().as_deref() {
            Some("pdf") if self.viewer_available => Some(SourceAction::OpenViewer {
                path: doc.path.clone(),
                page: doc.page,
                search_text: doc.excerpt.clone(),
            }),
            Some("txt") => Some(SourceAction::OpenPreview {
                url: self.download_url(doc.display_name()),
            }),
            Some("docx") | Some("doc") => Some(SourceAction::Download {
                url: self.download_url(doc.display_name()),
            }),
            _ => None,
        }
    }
}

impl Default for SourceResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DOWNLOAD_BASE)
    }
}
