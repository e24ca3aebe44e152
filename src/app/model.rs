use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::formats::{CatalogId, MediaKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub id: Uuid,
    pub catalog_id: CatalogId,
    pub kind: MediaKind,
    pub added_at: DateTime<Utc>,
}

impl FavoriteEntry {
    pub fn new(catalog_id: CatalogId, kind: MediaKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            catalog_id,
            kind,
            added_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    #[serde(alias = "tmdbId")]
    pub catalog_id: CatalogId,
    #[serde(alias = "mediaType")]
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayableUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}
