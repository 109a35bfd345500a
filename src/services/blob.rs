//! File/blob-store collaborator: upload-by-path returning a download URL.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("invalid blob path: {0}")]
    InvalidPath(String),
    #[error("blob storage failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("empty upload")]
    Empty,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` at `path` and returns the URL it can be fetched from.
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<String, BlobError>;

    async fn delete(&self, path: &str) -> Result<(), BlobError>;
}

/// Blobs written under `MEDIA_DIR`, served back by `GET /media/files/{*path}`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(path);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if path.is_empty() || !is_plain {
            return Err(BlobError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<String, BlobError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, &bytes).await?;
        tracing::info!("Stored blob {} ({} bytes)", path, bytes.len());
        Ok(format!("{}/media/files/{}", self.public_base_url, path))
    }

    async fn delete(&self, path: &str) -> Result<(), BlobError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Stores an editor or cover image under `dir` with a timestamped name and
/// returns its URL.
pub async fn upload_image(
    blobs: &dyn BlobStore,
    dir: &str,
    file_name: &str,
    bytes: Bytes,
) -> Result<String, BlobError> {
    if bytes.is_empty() {
        return Err(BlobError::Empty);
    }
    let path = format!(
        "{}/{}_{}",
        dir.trim_matches('/'),
        chrono::Utc::now().timestamp_millis(),
        sanitize_file_name(file_name)
    );
    blobs.upload(&path, bytes).await
}

/// Keeps uploaded names readable while stripping anything path-like.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// In-memory blob store for tests that records what was uploaded and removed.
#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    pub struct FakeBlobs {
        fail_uploads: bool,
        uploaded: Mutex<Vec<String>>,
        deleted: Mutex<Vec<String>>,
    }

    impl FakeBlobs {
        pub fn working() -> Self {
            Self {
                fail_uploads: false,
                uploaded: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail_uploads: true,
                ..Self::working()
            }
        }

        pub fn uploaded(&self) -> Vec<String> {
            self.uploaded.lock().unwrap().clone()
        }

        pub fn deleted(&self) -> Vec<String> {
            self.deleted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BlobStore for FakeBlobs {
        async fn upload(&self, path: &str, _bytes: Bytes) -> Result<String, BlobError> {
            if self.fail_uploads {
                return Err(BlobError::Io(std::io::Error::other("quota exceeded")));
            }
            self.uploaded.lock().unwrap().push(path.to_string());
            Ok(format!("https://files.example/{path}"))
        }

        async fn delete(&self, path: &str) -> Result<(), BlobError> {
            self.deleted.lock().unwrap().push(path.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("vanganh-blob-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn upload_writes_file_and_returns_url() {
        let root = temp_root();
        let blobs = LocalBlobStore::new(&root, "http://localhost:8080/");

        let url = blobs
            .upload("menus/monthly/2024_6_1_thucdon.pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap();

        assert_eq!(
            url,
            "http://localhost:8080/media/files/menus/monthly/2024_6_1_thucdon.pdf"
        );
        let stored = tokio::fs::read(root.join("menus/monthly/2024_6_1_thucdon.pdf"))
            .await
            .unwrap();
        assert_eq!(stored, b"%PDF");

        blobs.delete("menus/monthly/2024_6_1_thucdon.pdf").await.unwrap();
        // Deleting twice is not an error.
        blobs.delete("menus/monthly/2024_6_1_thucdon.pdf").await.unwrap();
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn rejects_escaping_paths() {
        let blobs = LocalBlobStore::new(temp_root(), "http://localhost");
        assert!(matches!(
            blobs.upload("../etc/passwd", Bytes::new()).await,
            Err(BlobError::InvalidPath(_))
        ));
        assert!(matches!(
            blobs.upload("/abs/path", Bytes::new()).await,
            Err(BlobError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn images_get_timestamped_paths() {
        let blobs = testing::FakeBlobs::working();
        let url = upload_image(&blobs, "news/covers/", "../bia.png", Bytes::from_static(b"png"))
            .await
            .unwrap();
        let stored = blobs.uploaded();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].starts_with("news/covers/"));
        assert!(stored[0].ends_with("_bia.png"));
        assert_eq!(url, format!("https://files.example/{}", stored[0]));

        assert!(matches!(
            upload_image(&blobs, "news/covers", "x.png", Bytes::new()).await,
            Err(BlobError::Empty)
        ));
    }

    #[test]
    fn sanitizes_file_names() {
        assert_eq!(sanitize_file_name("Thực đơn T6.pdf"), "Thực đơn T6.pdf");
        assert_eq!(sanitize_file_name("../../secret.pdf"), "secret.pdf");
        assert_eq!(sanitize_file_name("C:\\docs\\menu.pdf"), "menu.pdf");
        assert_eq!(sanitize_file_name("..."), "upload");
    }
}
