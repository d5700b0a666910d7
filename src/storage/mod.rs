//! Blob storage for uploaded images and videos.
//!
//! Files are written under a local directory that the router serves at `/files`.
//! Uploading returns the public URL of the stored file.

use std::path::{Component, Path, PathBuf};

use crate::errors::{AppError, AppResult};
use crate::models::MediaItem;

/// URL path under which stored files are served.
pub const FILES_ROUTE: &str = "/files";

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Path of the file relative to the storage root
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

/// A file received in a multipart form, not yet stored.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Local-directory blob store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    files_url: String,
}

impl BlobStore {
    /// Open the store, creating the root directory if needed.
    pub async fn open(root: &Path, public_url: &str) -> AppResult<Self> {
        tokio::fs::create_dir_all(root).await?;
        Ok(Self {
            root: root.to_path_buf(),
            files_url: format!("{}{}", public_url.trim_end_matches('/'), FILES_ROUTE),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `data` under `folder` and return its public URL.
    pub async fn upload(
        &self,
        folder: &str,
        file_name: Option<&str>,
        content_type: &str,
        data: &[u8],
    ) -> AppResult<StoredBlob> {
        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let extension = extension_for(content_type, file_name);
        let key = format!("{}/{}.{}", folder, uuid::Uuid::new_v4(), extension);
        let path = self.root.join(&key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;

        tracing::debug!("Stored blob {} ({} bytes)", key, data.len());

        Ok(StoredBlob {
            url: format!("{}/{}", self.files_url, key),
            key,
            content_type: content_type.to_string(),
            size: data.len(),
        })
    }

    /// Upload image and video files one after another, in order.
    ///
    /// Files that are not images or videos, or that fail to store, are skipped
    /// with a warning; earlier uploads are kept.
    pub async fn upload_media(&self, folder: &str, files: &[PendingFile]) -> Vec<MediaItem> {
        let mut media = Vec::with_capacity(files.len());
        for file in files {
            if !is_media_type(&file.content_type) {
                tracing::warn!(
                    "Skipping {:?}: unsupported media type {}",
                    file.file_name,
                    file.content_type
                );
                continue;
            }
            match self
                .upload(folder, file.file_name.as_deref(), &file.content_type, &file.data)
                .await
            {
                Ok(blob) => media.push(MediaItem {
                    url: blob.url,
                    content_type: blob.content_type,
                }),
                Err(e) => tracing::warn!("Skipping {:?}: upload failed: {}", file.file_name, e),
            }
        }
        media
    }

    /// Map a public URL back to its storage key, if this store issued it.
    pub fn key_for_url(&self, url: &str) -> Option<String> {
        let key = url.strip_prefix(&self.files_url)?.strip_prefix('/')?;
        let safe = Path::new(key)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        (safe && !key.is_empty()).then(|| key.to_string())
    }

    /// Delete the file behind `url`. URLs this store did not issue are ignored.
    pub async fn delete_url(&self, url: &str) -> AppResult<()> {
        let Some(key) = self.key_for_url(url) else {
            return Ok(());
        };
        match tokio::fs::remove_file(self.root.join(&key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal of several files, logging failures.
    pub async fn delete_urls<'a>(&self, urls: impl IntoIterator<Item = &'a str>) {
        // Collected up front so no borrowing iterator is held across an await
        let urls: Vec<String> = urls.into_iter().map(str::to_string).collect();
        for url in &urls {
            if let Err(e) = self.delete_url(url).await {
                tracing::warn!("Failed to delete blob {}: {}", url, e);
            }
        }
    }
}

pub fn is_media_type(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type.starts_with("video/")
}

const KNOWN_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("heic", "image/heic"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
];

/// File extension for a stored blob.
fn extension_for(content_type: &str, file_name: Option<&str>) -> String {
    if let Some((ext, _)) = KNOWN_TYPES.iter().find(|(_, ct)| *ct == content_type) {
        return ext.to_string();
    }
    file_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string())
}

/// Guess a content type from a file name or URL extension.
pub fn content_type_from_name(name: &str, fallback: &str) -> String {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    ext.and_then(|ext| {
        KNOWN_TYPES
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, ct)| ct.to_string())
    })
    .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file(name: &str, content_type: &str, data: &[u8]) -> PendingFile {
        PendingFile {
            field: "media".to_string(),
            file_name: Some(name.to_string()),
            content_type: content_type.to_string(),
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_upload_returns_public_url() {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::open(temp_dir.path(), "http://localhost:8080/")
            .await
            .unwrap();

        let blob = store
            .upload("posts", Some("beach.JPG"), "image/jpeg", b"jpeg-bytes")
            .await
            .unwrap();

        assert!(blob.url.starts_with("http://localhost:8080/files/posts/"));
        assert!(blob.url.ends_with(".jpg"));
        assert_eq!(blob.size, 10);
        assert!(temp_dir.path().join(&blob.key).exists());
        assert_eq!(store.key_for_url(&blob.url), Some(blob.key.clone()));

        store.delete_url(&blob.url).await.unwrap();
        assert!(!temp_dir.path().join(&blob.key).exists());
    }

    #[tokio::test]
    async fn test_upload_media_skips_failures_and_keeps_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::open(temp_dir.path(), "http://localhost")
            .await
            .unwrap();

        let files = vec![
            file("a.png", "image/png", b"a"),
            file("notes.txt", "text/plain", b"not media"),
            file("empty.jpg", "image/jpeg", b""),
            file("clip.mp4", "video/mp4", b"v"),
        ];
        let media = store.upload_media("posts", &files).await;

        assert_eq!(media.len(), 2);
        assert_eq!(media[0].content_type, "image/png");
        assert!(media[1].is_video());
    }

    #[tokio::test]
    async fn test_delete_urls_from_media_list() {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::open(temp_dir.path(), "http://localhost")
            .await
            .unwrap();

        let files = vec![
            file("a.png", "image/png", b"a"),
            file("clip.mp4", "video/mp4", b"v"),
        ];
        let media = store.upload_media("posts", &files).await;
        let keys: Vec<String> = media
            .iter()
            .filter_map(|m| store.key_for_url(&m.url))
            .collect();
        assert_eq!(keys.len(), 2);

        // Borrowing adapters over the media list, as the delete handlers pass them
        let removal = store.delete_urls(
            media
                .iter()
                .map(|m| m.url.as_str())
                .chain(std::iter::once("https://cdn.example/x.jpg")),
        );
        fn assert_send<T: Send>(_: &T) {}
        assert_send(&removal);
        removal.await;

        for key in keys {
            assert!(!temp_dir.path().join(key).exists());
        }
    }

    #[tokio::test]
    async fn test_foreign_urls_are_not_deleted() {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::open(temp_dir.path(), "http://localhost")
            .await
            .unwrap();

        assert_eq!(store.key_for_url("https://cdn.example/files/a.jpg"), None);
        assert_eq!(store.key_for_url("http://localhost/files/../secret"), None);
        store.delete_url("https://cdn.example/a.jpg").await.unwrap();
    }

    #[test]
    fn test_content_type_guessing() {
        assert_eq!(content_type_from_name("x/y/photo.PNG", "image/jpeg"), "image/png");
        assert_eq!(content_type_from_name("noext", "video/mp4"), "video/mp4");
        assert_eq!(extension_for("application/x-custom", Some("doc.Dat")), "dat");
        assert_eq!(extension_for("application/x-custom", None), "bin");
    }
}
