use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::app::model::FavoriteEntry;
use crate::error::{CatalogError, Result};
use crate::formats::{CatalogId, MediaKind};

/// The "my list" collection, unique by catalog id.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Most recently added first.
    async fn list(&self) -> Result<Vec<FavoriteEntry>>;
    async fn add(&self, catalog_id: CatalogId, kind: MediaKind) -> Result<FavoriteEntry>;
    async fn remove(&self, catalog_id: CatalogId) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryFavorites {
    entries: RwLock<Vec<FavoriteEntry>>,
}

impl InMemoryFavorites {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FavoritesStore for InMemoryFavorites {
    async fn list(&self) -> Result<Vec<FavoriteEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().cloned().collect())
    }

    async fn add(&self, catalog_id: CatalogId, kind: MediaKind) -> Result<FavoriteEntry> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.catalog_id == catalog_id) {
            return Err(CatalogError::Conflict(format!(
                "{catalog_id} is already in the list"
            )));
        }
        let entry = FavoriteEntry::new(catalog_id, kind);
        entries.push(entry.clone());
        tracing::info!(catalog_id, %kind, "favorite added");
        Ok(entry)
    }

    async fn remove(&self, catalog_id: CatalogId) -> Result<()> {
        let mut entries = self.entries.write().await;
        let Some(pos) = entries.iter().position(|e| e.catalog_id == catalog_id) else {
            return Err(CatalogError::NotFound(format!(
                "{catalog_id} is not in the list"
            )));
        };
        entries.remove(pos);
        tracing::info!(catalog_id, "favorite removed");
        Ok(())
    }
}
