//! # jotter-core
//!
//! Core types, traits, and the note/attachment consistency model for jotter.
//!
//! Notes carry free text plus attachments; the derived note type, the
//! synthetic link attachment, and the stored blobs are kept coherent by
//! [`NoteService`] and [`AttachmentManager`], written against the storage
//! collaborator traits in [`traits`].

pub mod attachments;
pub mod classify;
pub mod error;
pub mod file_safety;
pub mod filter;
pub mod links;
pub mod models;
pub mod sync;
pub mod traits;

// Re-export commonly used types at crate root
pub use attachments::AttachmentManager;
pub use classify::classify;
pub use error::{Error, Result};
pub use file_safety::{detect_content_type, sanitize_filename};
pub use filter::{filter_notes, Tab};
pub use links::{extract_links, render_spans, sync_link_attachment, Span};
pub use models::*;
pub use sync::NoteService;
pub use traits::*;
