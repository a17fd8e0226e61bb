//! Attachment lifecycle: blob upload, deletion, in-place text edits, and
//! cache-busted read-back.
//!
//! Every operation is independently fallible and never retried. A failed
//! upload mutates no attachment list; a failed delete leaves the attachment
//! in place so the user can retry instead of silently orphaning the blob.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::file_safety::sanitize_filename;
use crate::models::Attachment;
use crate::traits::BlobStore;

/// Orchestrates attachment blob operations against the Blob Store.
#[derive(Clone)]
pub struct AttachmentManager {
    blobs: Arc<dyn BlobStore>,
    http: reqwest::Client,
}

impl AttachmentManager {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            http: reqwest::Client::new(),
        }
    }

    /// Upload file bytes and derive the attachment record.
    ///
    /// The storage key is namespaced by owner and un-guessable within the
    /// namespace: `{owner}/{uuidv7}.{ext}`. Concurrent uploads for one draft
    /// are safe; each success is appended by the caller independently, in
    /// completion order.
    pub async fn upload(
        &self,
        owner: Uuid,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<Attachment> {
        let name = sanitize_filename(filename);
        let key = storage_key(owner, &name);
        self.blobs.put(&key, bytes, false).await?;
        let url = self.blobs.public_url(&key);
        debug!(file_path = %key, size = bytes.len(), "attachment uploaded");
        Ok(Attachment {
            name,
            content_type: content_type.to_string(),
            url,
            size: bytes.len() as i64,
            file_path: key,
        })
    }

    /// Remove an attachment's blob. Missing blobs count as removed, so a
    /// retried delete succeeds.
    pub async fn delete(&self, file_path: &str) -> Result<()> {
        self.blobs.remove(&[file_path.to_string()]).await?;
        debug!(file_path = %file_path, "attachment blob removed");
        Ok(())
    }

    /// Re-upload text content to an existing key. Upsert semantics keep the
    /// attachment's `url` and `filePath` stable across edits.
    pub async fn overwrite_text(
        &self,
        file_path: &str,
        content: &str,
        mime_type: &str,
    ) -> Result<()> {
        self.blobs.put(file_path, content.as_bytes(), true).await?;
        debug!(file_path = %file_path, mime_type = %mime_type, "text attachment overwritten");
        Ok(())
    }

    /// Fetch a text attachment's current content.
    ///
    /// Blob URLs are cached aggressively; a time-keyed query parameter makes
    /// an overwrite visible immediately.
    pub async fn read_text(&self, url: &str) -> Result<String> {
        let sep = if url.contains('?') { '&' } else { '?' };
        let busted = format!("{url}{sep}t={}", Utc::now().timestamp_millis());
        let response = self.http.get(&busted).send().await?;
        if !response.status().is_success() {
            return Err(Error::Store(format!(
                "fetching {url} returned {}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

/// Owner-namespaced, time-ordered, collision-free storage key. The file
/// extension survives (lowercased) so serving can detect a content type.
fn storage_key(owner: Uuid, sanitized_name: &str) -> String {
    match sanitized_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => {
            format!("{owner}/{}.{}", Uuid::now_v7(), ext.to_lowercase())
        }
        _ => format!("{owner}/{}", Uuid::now_v7()),
    }
}
