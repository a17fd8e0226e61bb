//! Core traits for jotter's storage collaborators.
//!
//! These traits define the interfaces the consistency model is written
//! against, enabling pluggable backends and testability. Record mutations
//! are scoped by equality filters on id and owner; zero rows matched is
//! reported, never silently ignored.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Attachment, Note, NoteType};

// =============================================================================
// RECORD STORE
// =============================================================================

/// A fully derived note record ready to insert.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub note_type: NoteType,
}

/// Replacement shape for an update; every field is written.
#[derive(Debug, Clone)]
pub struct NoteChange {
    pub title: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub note_type: NoteType,
}

/// Record Store collaborator for the notes table.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a new record; the store assigns `id` and both timestamps.
    async fn insert(&self, note: NewNote) -> Result<Note>;

    /// Replace title/content/attachments/type in a single statement scoped
    /// by `id AND user_id`, refreshing `updated_at`. Zero rows matched is
    /// [`Error::NotFoundOrForbidden`](crate::Error::NotFoundOrForbidden).
    async fn update(&self, id: i64, user_id: Uuid, change: NoteChange) -> Result<Note>;

    /// Delete scoped by `id AND user_id`; zero rows matched is
    /// [`Error::NotFoundOrForbidden`](crate::Error::NotFoundOrForbidden).
    async fn delete(&self, id: i64, user_id: Uuid) -> Result<()>;

    /// Fetch one note scoped by `id AND user_id`.
    async fn get(&self, id: i64, user_id: Uuid) -> Result<Note>;

    /// All notes for one owner, `updated_at` descending.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Note>>;
}

// =============================================================================
// BLOB STORE
// =============================================================================

/// Blob Store collaborator: key-addressed byte storage with public URLs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key`. Without `overwrite`, writing an existing
    /// key is an error.
    async fn put(&self, key: &str, bytes: &[u8], overwrite: bool) -> Result<()>;

    /// Read the bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove the given keys. Missing keys count as removed, so a retried
    /// delete succeeds.
    async fn remove(&self, keys: &[String]) -> Result<()>;

    /// Publicly resolvable URL for `key`.
    fn public_url(&self, key: &str) -> String;
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Identity collaborator: resolves a presented credential to a user.
#[async_trait]
pub trait Identity: Send + Sync {
    /// The user the credential belongs to, or `None` when it matches nobody.
    async fn resolve(&self, credential: Option<&str>) -> Option<Uuid>;
}
