use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    User,
    Bot,
}

/// A file the user attached when sending a message.
///
/// Shown as a header strip above the message body with the file name,
/// size, and a MIME-subtype badge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, size_bytes: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }

    /// Badge text derived from the MIME subtype, "FILE" when absent.
    pub fn badge_label(&self) -> String {
        self.mime_type
            .split_once('/')
            .map(|(_, subtype)| subtype.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_uppercase())
            .unwrap_or_else(|| "FILE".to_string())
    }
}

/// A source document a bot reply cites, with the matched excerpt and an
/// optional page locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub path: String,
    pub excerpt: String,
    pub page: Option<u32>,
}

impl SourceDocument {
    pub fn new(path: impl Into<String>, excerpt: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            excerpt: excerpt.into(),
            page: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Text after the last `.` in the path, lower-cased.
    ///
    /// Returns `None` when the path has no extension to extract.
    pub fn file_extension(&self) -> Option<String> {
        self.path
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.to_lowercase())
    }

    /// Last path segment after `/` or `\`, or the whole path when there is
    /// no separator.
    pub fn display_name(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(&self.path)
    }

    /// File-type badge text: the extension uppercased, "FILE" when
    /// extraction yields nothing.
    pub fn badge_label(&self) -> String {
        self.file_extension()
            .map(|ext| ext.to_uppercase())
            .unwrap_or_else(|| "FILE".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub kind: MessageKind,
    /// Markdown-formatted body text. Produced elsewhere; read-only here.
    pub content: String,
    /// Opaque URL of pre-recorded audio for this message, when available.
    pub recorded_audio_ref: Option<String>,
    pub sources: Vec<SourceDocument>,
    pub file: Option<UploadedFile>,
    /// True while the reply is still being produced.
    pub is_loading: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            recorded_audio_ref: None,
            sources: Vec::new(),
            file: None,
            is_loading: false,
            timestamp: Utc::now(),
        }
    }

    pub fn with_recorded_audio(mut self, url: impl Into<String>) -> Self {
        self.recorded_audio_ref = Some(url.into());
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourceDocument>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.file = Some(file);
        self
    }

    pub fn loading(mut self) -> Self {
        self.is_loading = true;
        self
    }

    pub fn is_user(&self) -> bool {
        self.kind == MessageKind::User
    }

    /// Whether this message gets a speech affordance: any message carrying
    /// recorded audio, and every bot message (synthesized fallback).
    pub fn wants_speech(&self) -> bool {
        self.recorded_audio_ref.is_some() || self.kind == MessageKind::Bot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension_lowercased() {
        let doc = SourceDocument::new("reports/Q1.PDF", "");
        assert_eq!(doc.file_extension(), Some("pdf".to_string()));
    }

    #[test]
    fn test_file_extension_missing() {
        let doc = SourceDocument::new("noext", "");
        assert_eq!(doc.file_extension(), None);
        assert_eq!(doc.badge_label(), "FILE");
    }

    #[test]
    fn test_file_extension_trailing_dot() {
        let doc = SourceDocument::new("strange.", "");
        assert_eq!(doc.file_extension(), None);
        assert_eq!(doc.badge_label(), "FILE");
    }

    #[test]
    fn test_badge_label_uppercased() {
        let doc = SourceDocument::new("image.png", "");
        assert_eq!(doc.badge_label(), "PNG");
    }

    #[test]
    fn test_display_name_forward_slash() {
        let doc = SourceDocument::new("reports/archive/Q1.pdf", "");
        assert_eq!(doc.display_name(), "Q1.pdf");
    }

    #[test]
    fn test_display_name_backslash() {
        let doc = SourceDocument::new("reports\\archive\\Q1.pdf", "");
        assert_eq!(doc.display_name(), "Q1.pdf");
    }

    #[test]
    fn test_display_name_no_separator() {
        let doc = SourceDocument::new("notes.txt", "");
        assert_eq!(doc.display_name(), "notes.txt");
    }

    #[test]
    fn test_display_name_trailing_separator() {
        let doc = SourceDocument::new("reports/", "");
        assert_eq!(doc.display_name(), "reports/");
    }

    #[test]
    fn test_uploaded_file_badge() {
        let file = UploadedFile::new("contract.pdf", 2048, "application/pdf");
        assert_eq!(file.badge_label(), "PDF");
        assert!((file.size_kb() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_uploaded_file_badge_fallback() {
        let file = UploadedFile::new("blob", 10, "application/");
        assert_eq!(file.badge_label(), "FILE");

        let file = UploadedFile::new("blob", 10, "octet-stream");
        assert_eq!(file.badge_label(), "FILE");
    }

    #[test]
    fn test_wants_speech() {
        let bot = Message::new(MessageKind::Bot, "hello");
        assert!(bot.wants_speech());

        let user = Message::new(MessageKind::User, "hello");
        assert!(!user.wants_speech());

        let user_audio =
            Message::new(MessageKind::User, "hello").with_recorded_audio("file:///tmp/a.wav");
        assert!(user_audio.wants_speech());
    }

    #[test]
    fn test_message_builder() {
        let msg = Message::new(MessageKind::Bot, "answer")
            .with_sources(vec![SourceDocument::new("notes.txt", "excerpt")])
            .with_recorded_audio("file:///tmp/reply.wav");

        assert_eq!(msg.kind, MessageKind::Bot);
        assert_eq!(msg.sources.len(), 1);
        assert!(msg.recorded_audio_ref.is_some());
        assert!(!msg.is_loading);
    }
}
