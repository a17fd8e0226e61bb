//! Note synchronization: the orchestration core.
//!
//! Every note mutation flows through [`NoteService`]. It derives the
//! persisted shape (title fallback, synthetic link attachment, type) and
//! defines the ordering and failure contract between the Record Store and
//! the Blob Store. Notes move `Draft` → `Persisted` → `Deleted`; a failed
//! save leaves the caller's draft intact, a failed blob delete never blocks
//! the record delete.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::attachments::AttachmentManager;
use crate::classify::classify;
use crate::error::{Error, Result};
use crate::links::sync_link_attachment;
use crate::models::{Attachment, Note, NoteDraft};
use crate::traits::{NewNote, NoteChange, NoteStore};

/// Characters of content used for a derived title.
const DERIVED_TITLE_CHARS: usize = 20;

/// Controller owning the note transitions; all mutations go through here.
#[derive(Clone)]
pub struct NoteService {
    records: Arc<dyn NoteStore>,
    attachments: AttachmentManager,
}

impl NoteService {
    pub fn new(records: Arc<dyn NoteStore>, attachments: AttachmentManager) -> Self {
        Self {
            records,
            attachments,
        }
    }

    /// Create a note from a draft.
    ///
    /// A draft with no content and no attachments is rejected before any
    /// store call. On failure nothing is persisted and the caller keeps the
    /// draft.
    pub async fn create(&self, user: Option<Uuid>, draft: NoteDraft) -> Result<Note> {
        let owner = user.ok_or(Error::Unauthenticated)?;
        if draft.content.is_empty() && draft.attachments.is_empty() {
            return Err(Error::EmptyNote);
        }
        let change = derive(draft);
        let note = self
            .records
            .insert(NewNote {
                user_id: owner,
                title: change.title,
                content: change.content,
                attachments: change.attachments,
                note_type: change.note_type,
            })
            .await?;
        info!(note_id = note.id, note_type = %note.note_type, "note created");
        Ok(note)
    }

    /// Update a note in place.
    ///
    /// The derived fields are recomputed exactly as on create, then written
    /// with a single statement scoped by `id` and the authenticated owner.
    /// Zero rows matched reports [`Error::NotFoundOrForbidden`].
    pub async fn update(&self, user: Option<Uuid>, id: i64, draft: NoteDraft) -> Result<Note> {
        let owner = user.ok_or(Error::Unauthenticated)?;
        let change = derive(draft);
        let note = self.records.update(id, owner, change).await?;
        info!(note_id = id, note_type = %note.note_type, "note updated");
        Ok(note)
    }

    /// Delete a note and its attachment blobs.
    ///
    /// Blob deletions that fail are logged and skipped: an orphaned blob is
    /// accepted over an undeletable note, so overall success depends only on
    /// the record delete. Retrying after a partial failure is safe because
    /// missing blobs already count as removed.
    pub async fn delete(&self, user: Option<Uuid>, id: i64) -> Result<()> {
        let owner = user.ok_or(Error::Unauthenticated)?;
        let note = self.records.get(id, owner).await?;
        for attachment in note.attachments.iter().filter(|a| a.has_blob()) {
            if let Err(error) = self.attachments.delete(&attachment.file_path).await {
                warn!(
                    note_id = id,
                    file_path = %attachment.file_path,
                    error = %error,
                    "attachment blob deletion failed; continuing with note removal"
                );
            }
        }
        self.records.delete(id, owner).await?;
        info!(note_id = id, "note deleted");
        Ok(())
    }

    /// Fetch one note scoped by id and owner.
    pub async fn get(&self, user: Option<Uuid>, id: i64) -> Result<Note> {
        let owner = user.ok_or(Error::Unauthenticated)?;
        self.records.get(id, owner).await
    }

    /// All of the owner's notes, most recently updated first.
    pub async fn list(&self, user: Option<Uuid>) -> Result<Vec<Note>> {
        let owner = user.ok_or(Error::Unauthenticated)?;
        self.records.list(owner).await
    }
}

/// The save-time derivation, shared by create and update: title fallback,
/// link attachment reconciliation, classification. Order matters — the title
/// falls back to the first attachment the user actually added, not to a
/// synthesized link.
fn derive(draft: NoteDraft) -> NoteChange {
    let NoteDraft {
        title,
        content,
        mut attachments,
    } = draft;
    let title = derive_title(&title, &content, &attachments);
    sync_link_attachment(&content, &mut attachments);
    let note_type = classify(&attachments);
    NoteChange {
        title,
        content,
        attachments,
        note_type,
    }
}

/// Trimmed title when given, else the first 20 characters of content, else
/// the first attachment's name, else empty.
fn derive_title(title: &str, content: &str, attachments: &[Attachment]) -> String {
    let trimmed = title.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    if !content.is_empty() {
        return content.chars().take(DERIVED_TITLE_CHARS).collect();
    }
    if let Some(first) = attachments.first() {
        return first.name.clone();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attachment, NoteType};
    use crate::traits::BlobStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        notes: Mutex<Vec<Note>>,
        next_id: AtomicI64,
        calls: AtomicUsize,
        fail_delete: bool,
    }

    #[async_trait]
    impl NoteStore for RecordingStore {
        async fn insert(&self, new: NewNote) -> Result<Note> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = Utc::now();
            let note = Note {
                id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
                title: new.title,
                content: new.content,
                attachments: new.attachments,
                note_type: new.note_type,
                user_id: new.user_id,
                created_at: now,
                updated_at: now,
            };
            self.notes.lock().unwrap().push(note.clone());
            Ok(note)
        }

        async fn update(&self, id: i64, user_id: Uuid, change: NoteChange) -> Result<Note> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut notes = self.notes.lock().unwrap();
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
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_delete {
                return Err(Error::Store("record delete refused".to_string()));
            }
            let mut notes = self.notes.lock().unwrap();
            let before = notes.len();
            notes.retain(|n| !(n.id == id && n.user_id == user_id));
            if notes.len() == before {
                return Err(Error::NotFoundOrForbidden);
            }
            Ok(())
        }

        async fn get(&self, id: i64, user_id: Uuid) -> Result<Note> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.notes
                .lock()
                .unwrap()
                .iter()
                .find(|n| n.id == id && n.user_id == user_id)
                .cloned()
                .ok_or(Error::NotFoundOrForbidden)
        }

        async fn list(&self, user_id: Uuid) -> Result<Vec<Note>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut notes: Vec<Note> = self
                .notes
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.user_id == user_id)
                .cloned()
                .collect();
            notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(notes)
        }
    }

    #[derive(Default)]
    struct SelectiveBlobs {
        fail_keys: HashSet<String>,
        removed: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BlobStore for SelectiveBlobs {
        async fn put(&self, _key: &str, _bytes: &[u8], _overwrite: bool) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Vec<u8>> {
            Err(Error::Store(format!("missing key: {key}")))
        }

        async fn remove(&self, keys: &[String]) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for key in keys {
                if self.fail_keys.contains(key) {
                    return Err(Error::Store(format!("cannot remove {key}")));
                }
                self.removed.lock().unwrap().push(key.clone());
            }
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("http://blobs.test/files/{key}")
        }
    }

    fn service(
        store: Arc<RecordingStore>,
        blobs: Arc<SelectiveBlobs>,
    ) -> NoteService {
        NoteService::new(store, AttachmentManager::new(blobs))
    }

    fn blob_attachment(name: &str, content_type: &str, file_path: &str) -> Attachment {
        Attachment {
            name: name.to_string(),
            content_type: content_type.to_string(),
            url: format!("http://blobs.test/files/{file_path}"),
            size: 42,
            file_path: file_path.to_string(),
        }
    }

    fn draft(title: &str, content: &str, attachments: Vec<Attachment>) -> NoteDraft {
        NoteDraft {
            title: title.to_string(),
            content: content.to_string(),
            attachments,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_empty_draft_before_any_store_call() {
        let store = Arc::new(RecordingStore::default());
        let blobs = Arc::new(SelectiveBlobs::default());
        let svc = service(store.clone(), blobs.clone());

        let result = svc.create(Some(Uuid::new_v4()), draft("", "", vec![])).await;

        assert!(matches!(result, Err(Error::EmptyNote)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert_eq!(blobs.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_without_identity_fails_before_any_store_call() {
        let store = Arc::new(RecordingStore::default());
        let blobs = Arc::new(SelectiveBlobs::default());
        let svc = service(store.clone(), blobs);

        let result = svc.create(None, draft("", "hello", vec![])).await;

        assert!(matches!(result, Err(Error::Unauthenticated)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_keeps_explicit_title_trimmed() {
        let svc = service(
            Arc::new(RecordingStore::default()),
            Arc::new(SelectiveBlobs::default()),
        );
        let note = svc
            .create(Some(Uuid::new_v4()), draft("  My Title  ", "body", vec![]))
            .await
            .unwrap();
        assert_eq!(note.title, "My Title");
    }

    #[tokio::test]
    async fn test_create_derives_title_from_content_prefix() {
        let svc = service(
            Arc::new(RecordingStore::default()),
            Arc::new(SelectiveBlobs::default()),
        );
        let note = svc
            .create(
                Some(Uuid::new_v4()),
                draft("", "0123456789abcdefghijKLMNOP", vec![]),
            )
            .await
            .unwrap();
        assert_eq!(note.title, "0123456789abcdefghij");
    }

    #[tokio::test]
    async fn test_derived_title_counts_characters_not_bytes() {
        let svc = service(
            Arc::new(RecordingStore::default()),
            Arc::new(SelectiveBlobs::default()),
        );
        let content = "日本語のノートです、これは長いタイトルの試験".to_string();
        let note = svc
            .create(Some(Uuid::new_v4()), draft("", &content, vec![]))
            .await
            .unwrap();
        assert_eq!(note.title.chars().count(), 20);
        assert!(content.starts_with(&note.title));
    }

    #[tokio::test]
    async fn test_create_derives_title_from_first_attachment_name() {
        let svc = service(
            Arc::new(RecordingStore::default()),
            Arc::new(SelectiveBlobs::default()),
        );
        let atts = vec![
            blob_attachment("slides.pdf", "application/pdf", "u/a.pdf"),
            blob_attachment("notes.txt", "text/plain", "u/b.txt"),
        ];
        let note = svc
            .create(Some(Uuid::new_v4()), draft("   ", "", atts))
            .await
            .unwrap();
        assert_eq!(note.title, "slides.pdf");
    }

    #[tokio::test]
    async fn test_create_synthesizes_single_link_attachment_from_first_url() {
        let svc = service(
            Arc::new(RecordingStore::default()),
            Arc::new(SelectiveBlobs::default()),
        );
        let note = svc
            .create(
                Some(Uuid::new_v4()),
                draft("", "see https://a.example and https://b.example", vec![]),
            )
            .await
            .unwrap();

        let links: Vec<&Attachment> = note.attachments.iter().filter(|a| a.is_link()).collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://a.example");
        assert_eq!(note.note_type, NoteType::Link);
    }

    #[tokio::test]
    async fn test_create_classifies_from_final_attachment_list() {
        let svc = service(
            Arc::new(RecordingStore::default()),
            Arc::new(SelectiveBlobs::default()),
        );
        let atts = vec![blob_attachment("pic.png", "image/png", "u/pic.png")];
        let note = svc
            .create(
                Some(Uuid::new_v4()),
                draft("", "with a link https://a.example", atts),
            )
            .await
            .unwrap();

        // Synthetic link is appended, but the image still wins classification.
        assert_eq!(note.attachments.len(), 2);
        assert_eq!(note.note_type, NoteType::Image);
    }

    #[tokio::test]
    async fn test_update_recomputes_derived_fields() {
        let store = Arc::new(RecordingStore::default());
        let svc = service(store, Arc::new(SelectiveBlobs::default()));
        let owner = Uuid::new_v4();

        let created = svc
            .create(Some(owner), draft("t", "go to https://a.example", vec![]))
            .await
            .unwrap();
        assert_eq!(created.note_type, NoteType::Link);

        let updated = svc
            .update(
                Some(owner),
                created.id,
                draft("t", "no more urls", created.attachments.clone()),
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert!(updated.attachments.is_empty());
        assert_eq!(updated.note_type, NoteType::Text);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_as_non_owner_is_not_found_and_changes_nothing() {
        let store = Arc::new(RecordingStore::default());
        let svc = service(store.clone(), Arc::new(SelectiveBlobs::default()));
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let note = svc
            .create(Some(owner), draft("mine", "original", vec![]))
            .await
            .unwrap();

        let result = svc
            .update(Some(stranger), note.id, draft("theirs", "tampered", vec![]))
            .await;
        assert!(matches!(result, Err(Error::NotFoundOrForbidden)));

        let unchanged = svc.get(Some(owner), note.id).await.unwrap();
        assert_eq!(unchanged.content, "original");
        assert_eq!(unchanged.title, "mine");
    }

    #[tokio::test]
    async fn test_update_missing_note_is_not_found() {
        let svc = service(
            Arc::new(RecordingStore::default()),
            Arc::new(SelectiveBlobs::default()),
        );
        let result = svc
            .update(Some(Uuid::new_v4()), 5, draft("", "content", vec![]))
            .await;
        assert!(matches!(result, Err(Error::NotFoundOrForbidden)));
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_every_blob() {
        let store = Arc::new(RecordingStore::default());
        let blobs = Arc::new(SelectiveBlobs::default());
        let svc = service(store, blobs.clone());
        let owner = Uuid::new_v4();

        let atts = vec![
            blob_attachment("a.png", "image/png", "u/a.png"),
            Attachment::link("https://a.example"),
            blob_attachment("b.pdf", "application/pdf", "u/b.pdf"),
        ];
        let note = svc
            .create(Some(owner), draft("", "https://a.example", atts))
            .await
            .unwrap();

        svc.delete(Some(owner), note.id).await.unwrap();

        assert!(matches!(
            svc.get(Some(owner), note.id).await,
            Err(Error::NotFoundOrForbidden)
        ));
        // Only blob-backed attachments reach the blob store; the link's
        // empty filePath never does.
        let removed = blobs.removed.lock().unwrap().clone();
        assert_eq!(removed, vec!["u/a.png".to_string(), "u/b.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_with_partial_blob_failure_still_deletes_record() {
        let store = Arc::new(RecordingStore::default());
        let blobs = Arc::new(SelectiveBlobs {
            fail_keys: HashSet::from(["u/stuck.png".to_string()]),
            ..Default::default()
        });
        let svc = service(store, blobs.clone());
        let owner = Uuid::new_v4();

        let atts = vec![
            blob_attachment("stuck.png", "image/png", "u/stuck.png"),
            blob_attachment("fine.pdf", "application/pdf", "u/fine.pdf"),
        ];
        let note = svc.create(Some(owner), draft("", "x", atts)).await.unwrap();

        // Success depends only on the record delete.
        svc.delete(Some(owner), note.id).await.unwrap();

        assert!(matches!(
            svc.get(Some(owner), note.id).await,
            Err(Error::NotFoundOrForbidden)
        ));
        let removed = blobs.removed.lock().unwrap().clone();
        assert_eq!(removed, vec!["u/fine.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_surfaces_record_failure_after_blob_cascade() {
        let store = Arc::new(RecordingStore {
            fail_delete: true,
            ..Default::default()
        });
        let blobs = Arc::new(SelectiveBlobs::default());
        let svc = service(store, blobs.clone());
        let owner = Uuid::new_v4();

        let atts = vec![blob_attachment("a.png", "image/png", "u/a.png")];
        let note = svc.create(Some(owner), draft("", "x", atts)).await.unwrap();

        let result = svc.delete(Some(owner), note.id).await;
        assert!(matches!(result, Err(Error::Store(_))));
        // The blob cascade already ran; a retry is safe because missing
        // blobs count as removed.
        assert_eq!(blobs.removed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_note_is_not_found() {
        let svc = service(
            Arc::new(RecordingStore::default()),
            Arc::new(SelectiveBlobs::default()),
        );
        let result = svc.delete(Some(Uuid::new_v4()), 99).await;
        assert!(matches!(result, Err(Error::NotFoundOrForbidden)));
    }

    #[tokio::test]
    async fn test_list_scopes_to_owner() {
        let svc = service(
            Arc::new(RecordingStore::default()),
            Arc::new(SelectiveBlobs::default()),
        );
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        svc.create(Some(alice), draft("a1", "x", vec![])).await.unwrap();
        svc.create(Some(bob), draft("b1", "y", vec![])).await.unwrap();
        svc.create(Some(alice), draft("a2", "z", vec![])).await.unwrap();

        let notes = svc.list(Some(alice)).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.user_id == alice));
    }

    #[tokio::test]
    async fn test_list_without_identity_fails() {
        let svc = service(
            Arc::new(RecordingStore::default()),
            Arc::new(SelectiveBlobs::default()),
        );
        assert!(matches!(
            svc.list(None).await,
            Err(Error::Unauthenticated)
        ));
    }

    #[test]
    fn test_derive_title_fallback_chain() {
        let att = blob_attachment("doc.pdf", "application/pdf", "u/doc.pdf");
        assert_eq!(derive_title(" Kept ", "content", &[att.clone()]), "Kept");
        assert_eq!(derive_title("", "short", &[att.clone()]), "short");
        assert_eq!(derive_title("", "", &[att]), "doc.pdf");
        assert_eq!(derive_title("", "", &[]), "");
    }
}
