//! Filesystem blob store.
//!
//! Stores attachment bytes under a base directory, keyed by the storage key
//! chosen at upload (`{owner}/{uuid}.{ext}`). Writes are atomic: bytes land
//! in a temp file that is fsynced and renamed over the destination, so a
//! crash never leaves a half-written blob at a published URL.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use jotter_core::{BlobStore, Error, Result};

/// Blob store backed by a local directory.
pub struct FsBlobStore {
    base_path: PathBuf,
    public_base: String,
}

impl FsBlobStore {
    /// Create a new filesystem blob store.
    ///
    /// `public_base` is the URL prefix blobs are served under, e.g.
    /// `http://localhost:3700/files`.
    pub fn new(base_path: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        let public_base = public_base.into().trim_end_matches('/').to_string();
        Self {
            base_path: base_path.into(),
            public_base,
        }
    }

    /// Resolve a storage key to a path under the base directory.
    ///
    /// Keys come back from stored attachment records as well as from upload,
    /// so they are re-checked on every call: empty, absolute, or traversing
    /// keys never touch the filesystem.
    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.contains('\\')
            && key
                .split('/')
                .all(|part| !part.is_empty() && part != "." && part != "..");
        if !valid {
            return Err(Error::InvalidInput(format!("invalid storage key: {key}")));
        }
        Ok(self.base_path.join(key))
    }

    /// Validate that the store can write, read, and delete files.
    ///
    /// Performs a full round-trip test at startup to catch filesystem issues
    /// (overlayfs quirks, permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join(".health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await; // Best-effort cleanup

        Ok(())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], overwrite: bool) -> Result<()> {
        let full_path = self.object_path(key)?;
        debug!(key = %key, full_path = %full_path.display(), size = bytes.len(), overwrite, "blob_store: put");

        if !overwrite && fs::try_exists(&full_path).await? {
            return Err(Error::Store(format!("blob already exists: {key}")));
        }

        // Create parent directories
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "blob_store: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "blob_store: File::create failed");
            e
        })?;
        file.write_all(bytes).await.map_err(|e| {
            warn!(error = %e, "blob_store: write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "blob_store: rename failed");
            e
        })?;

        // Set permissions to 0644 (rw-r--r--, no execute)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let full_path = self.object_path(key)?;
        if !fs::try_exists(&full_path).await? {
            return Err(Error::NotFoundOrForbidden);
        }
        Ok(fs::read(full_path).await?)
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            let full_path = self.object_path(key)?;
            if fs::try_exists(&full_path).await? {
                fs::remove_file(&full_path).await?;
                debug!(key = %key, "blob_store: removed");
            } else {
                debug!(key = %key, "blob_store: already absent");
            }
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}
