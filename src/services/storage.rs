use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// SHA-256 fingerprint of an upload, hex-encoded (64 chars).
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// A document written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub document_hash: String,
    pub path: PathBuf,
}

/// Content-addressed local store for uploaded documents.
///
/// Files live at `<root>/<hash[0..2]>/<hash>.<ext>`, so identical uploads
/// share one file. Nothing is ever deleted here.
pub struct DocumentStorage {
    root: PathBuf,
}

impl DocumentStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hash and persist an upload.
    pub async fn save(&self, data: &[u8]) -> Result<StoredDocument, StorageError> {
        if data.is_empty() {
            return Err(StorageError::Empty);
        }

        let document_hash = content_hash(data);
        let dir = self.root.join(&document_hash[..2]);
        let path = dir.join(format!("{}.{}", document_hash, extension_for(data)));

        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(path = %path.display(), "Document already stored");
        } else {
            tokio::fs::create_dir_all(&dir).await?;
            // Write then rename so a concurrent reader never sees a partial file.
            let tmp = dir.join(format!("{}.{}.tmp", document_hash, uuid::Uuid::new_v4()));
            tokio::fs::write(&tmp, data).await?;
            tokio::fs::rename(&tmp, &path).await?;
        }

        Ok(StoredDocument {
            document_hash,
            path,
        })
    }
}

/// File extension from the sniffed image format, `bin` when unrecognised.
fn extension_for(data: &[u8]) -> &'static str {
    image::guess_format(data)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("bin")
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Uploaded document is empty")]
    Empty,

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
