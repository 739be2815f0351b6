use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Filesystem store for uploaded print images. Files are renamed to
/// generated UUIDs on save; only the stored name is persisted with the
/// order.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub async fn init(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> AppResult<String> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(OsStr::to_str)
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "jpg".to_string());
        let stored = format!("{}.{ext}", Uuid::new_v4());
        fs::write(self.root.join(&stored), bytes).await?;
        Ok(stored)
    }

    pub async fn load(&self, stored_name: &str) -> AppResult<Vec<u8>> {
        // Stored names are flat UUID file names; anything that walks the
        // tree is not ours.
        if stored_name.contains(['/', '\\']) || stored_name.contains("..") {
            return Err(AppError::BadRequest("invalid image reference".into()));
        }
        let bytes = fs::read(self.root.join(stored_name)).await?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::init(dir.path()).await.unwrap();

        let stored = store.save("family-shoot.JPG", b"jpeg-bytes").await.unwrap();
        assert!(stored.ends_with(".jpg"));

        let bytes = store.load(&stored).await.unwrap();
        assert_eq!(bytes, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn odd_extensions_fall_back_to_jpg() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::init(dir.path()).await.unwrap();

        let stored = store.save("no-extension", b"x").await.unwrap();
        assert!(stored.ends_with(".jpg"));

        let stored = store.save("weird.../...name", b"x").await.unwrap();
        assert!(stored.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn load_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::init(dir.path()).await.unwrap();

        assert!(store.load("../secret").await.is_err());
        assert!(store.load("a/b.jpg").await.is_err());
    }
}
