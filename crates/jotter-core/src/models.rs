//! Core data models for jotter.
//!
//! These types are shared across all jotter crates and represent the note
//! and attachment domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Sentinel attachment type for links synthesized from note content.
pub const LINK_TYPE: &str = "link";

// =============================================================================
// ATTACHMENTS
// =============================================================================

/// A file, image, or link associated with a note.
///
/// Attachments exist only embedded in a note's attachment list and are never
/// persisted standalone. The `type`/`filePath` JSON field names are the
/// persisted wire shape; the attachment rows predate this implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Original file name, or the URL itself for synthesized links.
    pub name: String,
    /// MIME type, or the sentinel `"link"`.
    #[serde(rename = "type")]
    pub content_type: String,
    /// Publicly resolvable URL.
    pub url: String,
    /// Size in bytes; 0 for links.
    pub size: i64,
    /// Blob-store key; empty for links.
    #[serde(rename = "filePath", default)]
    pub file_path: String,
}

impl Attachment {
    /// Synthesize a link attachment from an extracted URL.
    pub fn link(url: &str) -> Self {
        Self {
            name: url.to_string(),
            content_type: LINK_TYPE.to_string(),
            url: url.to_string(),
            size: 0,
            file_path: String::new(),
        }
    }

    /// True for synthesized link attachments.
    pub fn is_link(&self) -> bool {
        self.content_type == LINK_TYPE
    }

    /// True when this attachment references a stored blob.
    pub fn has_blob(&self) -> bool {
        !self.file_path.is_empty()
    }
}

// =============================================================================
// NOTES
// =============================================================================

/// Note type derived from the attachment list.
///
/// Always recomputed from the attachments on save, never set independently
/// of the list it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Text,
    Image,
    File,
    Link,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Text => "text",
            NoteType::Image => "image",
            NoteType::File => "file",
            NoteType::Link => "link",
        }
    }
}

impl std::fmt::Display for NoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NoteType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(NoteType::Text),
            "image" => Ok(NoteType::Image),
            "file" => Ok(NoteType::File),
            "link" => Ok(NoteType::Link),
            other => Err(Error::InvalidInput(format!("unknown note type: {other}"))),
        }
    }
}

/// The user-facing unit of content: free text plus attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Assigned by the Record Store on insert.
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Append-ordered; concurrent uploads land in completion order.
    pub attachments: Vec<Attachment>,
    /// Always `classify(&attachments)` as of the last save.
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied shape for create and update; the derived fields (title
/// fallback, synthetic link attachment, type) are computed on save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}
