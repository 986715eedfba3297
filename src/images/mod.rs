//! Image hosting
//!
//! Uploaded files are staged on local disk, handed to an [`ImageHost`] and removed again.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use axum::body::Bytes;

use crate::error::AppError;
use crate::utils::staged_file_name;

mod cloudinary;

pub use cloudinary::{Cloudinary, CloudinaryCredentials};

/// A remote service that turns a local image file into a durable public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<String, AppError>;
}

/// An image file received from a browser form.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Stages uploads in a local directory and pushes them to the image host.
#[derive(Clone)]
pub struct ImageStore {
    host: Arc<dyn ImageHost>,
    staging_dir: PathBuf,
}

impl ImageStore {
    pub fn new(host: Arc<dyn ImageHost>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            host,
            staging_dir: staging_dir.into(),
        }
    }

    /// Upload `image` and return its URL. The staged copy is removed whether or not the
    /// upload succeeded; nothing else in the staging directory is touched.
    pub async fn store(&self, image: UploadedImage) -> Result<String, AppError> {
        if image.bytes.is_empty() {
            return Err(AppError::MissingImage);
        }

        tokio::fs::create_dir_all(&self.staging_dir).await?;
        let path = self.staging_dir.join(staged_file_name(&image.file_name));
        tokio::fs::write(&path, &image.bytes).await?;

        let uploaded = self.host.upload(&path).await;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Could not remove staged upload {}: {}", path.display(), e);
        }

        match &uploaded {
            Ok(url) => tracing::info!("Uploaded {} to {}", image.file_name, url),
            Err(e) => tracing::warn!("Upload of {} failed: {}", image.file_name, e),
        }
        uploaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records whether the staged file was on disk at upload time.
    struct RecordingHost {
        seen: Mutex<Vec<(PathBuf, bool)>>,
        fail: bool,
    }

    #[async_trait]
    impl ImageHost for RecordingHost {
        async fn upload(&self, path: &Path) -> Result<String, AppError> {
            self.seen
                .lock()
                .unwrap()
                .push((path.to_owned(), path.exists()));
            if self.fail {
                Err(AppError::ImageHost("rejected".into()))
            } else {
                Ok("https://img.test/1.jpg".into())
            }
        }
    }

    fn image() -> UploadedImage {
        UploadedImage {
            file_name: "beach.jpg".into(),
            bytes: Bytes::from_static(b"\xff\xd8\xff\xe0 not really a jpeg"),
        }
    }

    #[tokio::test]
    async fn staged_file_is_removed_but_neighbours_survive() {
        let dir = tempfile::tempdir().unwrap();
        let neighbour = dir.path().join("someone-elses-upload.jpg");
        std::fs::write(&neighbour, b"pending").unwrap();

        let host = Arc::new(RecordingHost {
            seen: Mutex::new(Vec::new()),
            fail: false,
        });
        let store = ImageStore::new(host.clone(), dir.path());

        let url = store.store(image()).await.unwrap();
        assert_eq!(url, "https://img.test/1.jpg");

        let seen = host.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (staged, existed) = &seen[0];
        assert!(existed);
        assert!(!staged.exists());
        assert!(neighbour.exists());
    }

    #[tokio::test]
    async fn staged_file_is_removed_when_upload_fails() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost {
            seen: Mutex::new(Vec::new()),
            fail: true,
        });
        let store = ImageStore::new(host.clone(), dir.path());

        assert!(matches!(
            store.store(image()).await,
            Err(AppError::ImageHost(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn empty_images_never_reach_the_host() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(RecordingHost {
            seen: Mutex::new(Vec::new()),
            fail: false,
        });
        let store = ImageStore::new(host.clone(), dir.path());

        let empty = UploadedImage {
            file_name: "empty.jpg".into(),
            bytes: Bytes::new(),
        };
        assert!(matches!(store.store(empty).await, Err(AppError::MissingImage)));
        assert!(host.seen.lock().unwrap().is_empty());
    }
}
