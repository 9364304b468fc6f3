//! Uploaded photo storage.
//!
//! Files live flat in one upload directory under generated names
//! (`{uuid}_{millis}{.ext}`), so client-supplied names never reach the
//! filesystem. Products, plants and blogs store only the generated name.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Largest accepted photo, in bytes.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Accepted photo content types.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif"];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Photo file is empty")]
    Empty,

    #[error("File size exceeds maximum limit of 5MB")]
    TooLarge,

    #[error("Only JPEG, PNG and GIF images are allowed")]
    UnsupportedType,

    #[error("Invalid file path sequence in filename: {0}")]
    InvalidName(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Errors caused by the upload itself rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Empty | Self::TooLarge | Self::UnsupportedType | Self::InvalidName(_)
        )
    }
}

/// A photo received from a multipart request.
#[derive(Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A stored file read back for serving.
#[derive(Debug)]
pub struct StoredFile {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Outcome of an orphan sweep.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub failed: usize,
}

/// Check size, type and name of an upload.
///
/// # Errors
///
/// Returns the first rule the upload breaks.
pub fn validate_photo(upload: &PhotoUpload) -> Result<(), StorageError> {
    if upload.bytes.is_empty() {
        return Err(StorageError::Empty);
    }
    if upload.bytes.len() > MAX_PHOTO_BYTES {
        return Err(StorageError::TooLarge);
    }
    let allowed = upload.content_type.as_deref().is_some_and(|ct| {
        ALLOWED_CONTENT_TYPES
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct.trim()))
    });
    if !allowed {
        return Err(StorageError::UnsupportedType);
    }
    if upload.file_name.contains("..") {
        return Err(StorageError::InvalidName(upload.file_name.clone()));
    }
    Ok(())
}

/// Content type derived from a stored file's extension.
#[must_use]
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Generated storage name keeping the original (lowercased) extension.
fn generated_name(original: &str, now: DateTime<Utc>) -> String {
    let ext = original
        .rfind('.')
        .filter(|&idx| idx > 0)
        .and_then(|idx| original.get(idx + 1..))
        .filter(|ext| !ext.is_empty() && ext.bytes().all(|b| b.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{}_{}{ext}", Uuid::new_v4(), now.timestamp_millis())
}

/// Flat directory of uploaded photos.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub async fn init(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tracing::info!(path = %self.root.display(), "Upload directory ready");
        Ok(())
    }

    fn path_of(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        if file_name.is_empty()
            || file_name.contains("..")
            || file_name.contains('/')
            || file_name.contains('\\')
        {
            return Err(StorageError::InvalidName(file_name.to_owned()));
        }
        Ok(self.root.join(file_name))
    }

    /// Validate and write an upload, returning its generated name.
    ///
    /// # Errors
    ///
    /// Returns validation errors or an I/O error.
    #[tracing::instrument(skip(self, upload), fields(original = %upload.file_name))]
    pub async fn store(&self, upload: &PhotoUpload) -> Result<String, StorageError> {
        validate_photo(upload)?;
        let name = generated_name(&upload.file_name, Utc::now());
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&name), &upload.bytes).await?;
        tracing::info!(stored = %name, "Stored photo");
        Ok(name)
    }

    /// Store `upload` if one was sent.
    ///
    /// # Errors
    ///
    /// Same as [`FileStorage::store`].
    pub async fn store_optional(
        &self,
        upload: Option<&PhotoUpload>,
    ) -> Result<Option<String>, StorageError> {
        match upload {
            Some(upload) => self.store(upload).await.map(Some),
            None => Ok(None),
        }
    }

    /// Remove a file written for a save that then failed.
    pub async fn discard(&self, file_name: Option<&str>) {
        if let Some(name) = file_name {
            self.delete_quietly(name).await;
        }
    }

    /// Read a stored file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown names and `InvalidName` for path tricks.
    pub async fn load(&self, file_name: &str) -> Result<StoredFile, StorageError> {
        let path = self.path_of(file_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(StoredFile {
                bytes,
                content_type: content_type_for(file_name),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(file_name.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored file. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be removed.
    pub async fn delete(&self, file_name: &str) -> Result<bool, StorageError> {
        let path = self.path_of(file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(file = %file_name, "Deleted photo");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(file = %file_name, "Photo to delete does not exist");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete and only log failures. Used where a leftover file is harmless.
    pub async fn delete_quietly(&self, file_name: &str) {
        if let Err(e) = self.delete(file_name).await {
            tracing::warn!(file = %file_name, error = %e, "Failed to delete photo");
        }
    }

    /// Delete every regular file in the upload directory that is not in
    /// `referenced`. Individual failures are logged and counted.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be listed.
    pub async fn cleanup_orphans(
        &self,
        referenced: &HashSet<String>,
    ) -> Result<CleanupReport, StorageError> {
        let mut report = CleanupReport::default();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if !is_file {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if referenced.contains(&name) {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    tracing::debug!(file = %name, "Deleted orphaned photo");
                    report.deleted.push(name);
                }
                Err(e) => {
                    tracing::error!(file = %name, error = %e, "Failed to delete orphaned photo");
                    report.failed += 1;
                }
            }
        }
        report.deleted.sort();
        Ok(report)
    }
}
