//! Filesystem asset store
//!
//! Maps opaque asset keys to bytes under a configured root directory. The
//! render pipeline only reads; uploads and replacement happen in the
//! book-management layer, which writes a new file and repoints the catalog
//! record rather than mutating bytes in place.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    /// The key looks fine but no bytes exist for it.
    #[error("Asset not found: {0}")]
    Missing(String),

    /// The key would escape the asset root or is otherwise unusable.
    #[error("Invalid asset key: {0}")]
    InvalidKey(String),

    #[error("Asset read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only byte store rooted at a directory.
#[derive(Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the bytes for a key.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::Missing(key.to_string()))
            }
            Err(e) => Err(AssetError::Io(e)),
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.resolve(key) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Resolve a key to a path, refusing anything that steps outside the
    /// root. Keys may contain subdirectories but never `..` or an absolute
    /// prefix.
    fn resolve(&self, key: &str) -> Result<PathBuf, AssetError> {
        // Stored URLs look like "/static/<key>"; accept them as-is.
        let key_trimmed = key
            .strip_prefix("/static/")
            .or_else(|| key.strip_prefix("static/"))
            .unwrap_or(key);

        if key_trimmed.is_empty() {
            return Err(AssetError::InvalidKey(key.to_string()));
        }

        let relative = Path::new(key_trimmed);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(AssetError::InvalidKey(key.to_string())),
            }
        }

        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_existing_asset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("book.pdf"), b"%PDF-fake").unwrap();

        let store = AssetStore::new(dir.path());
        let bytes = store.read("book.pdf").await.unwrap();
        assert_eq!(bytes, b"%PDF-fake");
        assert!(store.exists("book.pdf").await);
    }

    #[tokio::test]
    async fn static_prefix_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("book.pdf"), b"x").unwrap();

        let store = AssetStore::new(dir.path());
        assert!(store.read("/static/book.pdf").await.is_ok());
    }

    #[tokio::test]
    async fn missing_asset_is_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        match store.read("gone.pdf").await {
            Err(AssetError::Missing(key)) => assert_eq!(key, "gone.pdf"),
            other => panic!("expected Missing, got {:?}", other.map(|b| b.len())),
        }
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        assert!(matches!(
            store.read("../etc/passwd").await,
            Err(AssetError::InvalidKey(_))
        ));
        assert!(matches!(
            store.read("/etc/passwd").await,
            Err(AssetError::InvalidKey(_))
        ));
        assert!(matches!(store.read("").await, Err(AssetError::InvalidKey(_))));
    }
}
