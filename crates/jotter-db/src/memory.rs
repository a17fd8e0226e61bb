//! In-memory store implementations.
//!
//! Back the server when it runs without `DATABASE_URL` (scratch mode) and
//! give integration tests real stores without Postgres or a disk. Semantics
//! match the production implementations: owner scoping, zero-rows-matched
//! errors, and the no-overwrite put contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use jotter_core::{BlobStore, Error, NewNote, Note, NoteChange, NoteStore, Result};

/// Note store over a process-local vector.
pub struct MemoryNoteStore {
    notes: RwLock<Vec<Note>>,
    next_id: AtomicI64,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self {
            notes: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryNoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn insert(&self, note: NewNote) -> Result<Note> {
        let now = Utc::now();
        let stored = Note {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: note.title,
            content: note.content,
            attachments: note.attachments,
            note_type: note.note_type,
            user_id: note.user_id,
            created_at: now,
            updated_at: now,
        };
        self.notes.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: i64, user_id: Uuid, change: NoteChange) -> Result<Note> {
        let mut notes = self.notes.write().await;
        let note = notes
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .ok_or(Error::NotFoundOrForbidden)?;
        note.title = change.title;
        note.content = change.content;
        note.attachments = change.attachments;
        note.note_type = change.note_type;
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn delete(&self, id: i64, user_id: Uuid) -> Result<()> {
        let mut notes = self.notes.write().await;
        let pos = notes
            .iter()
            .position(|n| n.id == id && n.user_id == user_id)
            .ok_or(Error::NotFoundOrForbidden)?;
        notes.remove(pos);
        Ok(())
    }

    async fn get(&self, id: i64, user_id: Uuid) -> Result<Note> {
        self.notes
            .read()
            .await
            .iter()
            .find(|n| n.id == id && n.user_id == user_id)
            .cloned()
            .ok_or(Error::NotFoundOrForbidden)
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .notes
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(notes)
    }
}

/// Blob store over a process-local map.
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    public_base: String,
}

impl MemoryBlobStore {
    /// `public_base` is the URL prefix blobs are served under, matching
    /// [`FsBlobStore::new`](crate::FsBlobStore::new).
    pub fn new(public_base: impl Into<String>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], overwrite: bool) -> Result<()> {
        let mut objects = self.objects.write().await;
        if !overwrite && objects.contains_key(key) {
            return Err(Error::Store(format!("blob already exists: {key}")));
        }
        objects.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or(Error::NotFoundOrForbidden)
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        let mut objects = self.objects.write().await;
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}
