//! Document catalog
//!
//! Read-only view of document metadata for the render pipeline. Records are
//! owned by the book-management layer; this process loads them from a JSON
//! manifest at startup and treats them as immutable apart from whole-record
//! replacement through [`Catalog::insert`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Who may view a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Anyone, with or without an identity.
    Public,
    /// Requires a verified identity claim (premium content).
    Restricted,
}

/// A stored PDF associated with a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    /// Owning book record in the catalog service.
    #[serde(default)]
    pub book_id: Option<String>,
    pub visibility: Visibility,
    /// Asset-store key of the PDF bytes. Absent for text-only books.
    #[serde(default)]
    pub asset: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Thread-safe document lookup table.
#[derive(Clone, Default)]
pub struct Catalog {
    documents: Arc<RwLock<HashMap<String, Document>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a manifest file: a JSON array of documents.
    pub async fn load_manifest(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let bytes = tokio::fs::read(path).await?;
        let records: Vec<Document> = serde_json::from_slice(&bytes)?;
        let catalog = Self::new();
        for doc in records {
            catalog.insert(doc).await;
        }
        Ok(catalog)
    }

    pub async fn get(&self, id: &str) -> Option<Document> {
        let documents = self.documents.read().await;
        documents.get(id).cloned()
    }

    /// Insert or replace a record. The book-management layer replaces the
    /// whole record when a file is swapped; bytes are never mutated in place.
    pub async fn insert(&self, document: Document) {
        let mut documents = self.documents.write().await;
        documents.insert(document.id.clone(), document);
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

/// Document identifiers come from URL path segments; anything outside this
/// shape is rejected before a catalog lookup.
pub fn is_valid_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
