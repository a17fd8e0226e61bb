//! Read-side note filtering.
//!
//! The displayed list is the subset of fetched notes matching the active tab
//! AND a free-text search. Filtering is stateless and recomputed on every
//! query change; nothing here is persisted.

use serde::{Deserialize, Serialize};

use crate::models::{Note, NoteType};

/// Active-tab predicate over a fetched note list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    All,
    /// The "recent" tab shows plain-text notes.
    Recent,
    Files,
    Images,
    Links,
}

impl Tab {
    /// Parse a tab query value. Unknown values fall back to [`Tab::All`].
    pub fn parse(s: &str) -> Tab {
        match s {
            "recent" => Tab::Recent,
            "files" => Tab::Files,
            "images" => Tab::Images,
            "links" => Tab::Links,
            _ => Tab::All,
        }
    }

    fn matches(&self, note: &Note) -> bool {
        match self {
            Tab::All => true,
            Tab::Recent => note.note_type == NoteType::Text,
            Tab::Files => note.note_type == NoteType::File,
            Tab::Images => note.note_type == NoteType::Image,
            Tab::Links => note.note_type == NoteType::Link,
        }
    }
}

/// Apply both predicates: tab match AND case-insensitive substring search
/// against title or content.
pub fn filter_notes<'a>(notes: &'a [Note], tab: Tab, query: &str) -> Vec<&'a Note> {
    let needle = query.to_lowercase();
    notes
        .iter()
        .filter(|note| tab.matches(note))
        .filter(|note| {
            note.title.to_lowercase().contains(&needle)
                || note.content.to_lowercase().contains(&needle)
        })
        .collect()
}
